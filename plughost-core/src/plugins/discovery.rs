//! Module discovery - enumerates installable plugin modules without loading them

use std::path::{Path, PathBuf};

use plughost_api::{MANIFEST_FILE, ModuleManifest};

/// Description of a discoverable plugin module
///
/// Produced by discovery and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleMetadata {
    /// Plugin identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Module version (informational)
    pub version: String,
    /// Backing library file
    pub file: PathBuf,
    /// Whether the module loads at startup without an explicit setting
    pub enabled_by_default: bool,
    /// Whether the record carries everything needed to attempt a load
    pub valid: bool,
}

impl ModuleMetadata {
    /// Record for a module directory whose manifest could not be used
    fn invalid(id: String, location: &Path) -> Self {
        Self {
            id,
            file: location.to_path_buf(),
            ..Default::default()
        }
    }
}

/// Source of module metadata
///
/// Every call is a fresh snapshot; implementations have no side effects.
pub trait ModuleDiscovery {
    /// All installable modules, in preference order
    fn enumerate_all(&self) -> Vec<ModuleMetadata>;

    /// Modules claiming `id`, in preference order (first match wins)
    fn enumerate_by_id(&self, id: &str) -> Vec<ModuleMetadata> {
        self.enumerate_all()
            .into_iter()
            .filter(|m| m.id == id)
            .collect()
    }
}

/// Discovery over plugin directories on disk
///
/// Each immediate sub-directory of a search directory is a module: a
/// `plugin.toml` manifest plus the library it names. Search directories are
/// visited in order and modules within one directory by path, so the
/// preference order is stable across runs.
#[derive(Debug, Clone)]
pub struct DirectoryDiscovery {
    search_dirs: Vec<PathBuf>,
}

impl DirectoryDiscovery {
    /// Create a discovery over `search_dirs`, highest preference first
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Directories searched, in preference order
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Module directories directly under `base_dir`, sorted by path
    fn module_dirs(base_dir: &Path) -> Vec<PathBuf> {
        if !base_dir.exists() {
            tracing::debug!(dir = %base_dir.display(), "Plugin directory does not exist");
            return Vec::new();
        }

        let entries = match std::fs::read_dir(base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %base_dir.display(), error = %e, "Cannot read plugin directory");
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        dirs
    }

    /// Read one module directory into a metadata record
    fn read_module(dir: &Path) -> ModuleMetadata {
        let dir_name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = match std::fs::read_to_string(&manifest_path) {
            Ok(contents) => match ModuleManifest::parse(&contents) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::warn!(path = %manifest_path.display(), error = %e, "Unusable plugin manifest");
                    return ModuleMetadata::invalid(dir_name, dir);
                }
            },
            Err(e) => {
                tracing::debug!(path = %manifest_path.display(), error = %e, "No plugin manifest");
                return ModuleMetadata::invalid(dir_name, dir);
            }
        };

        let library = find_library(dir, &manifest);
        let valid = !manifest.id.is_empty() && library.is_some();
        if library.is_none() {
            tracing::debug!(plugin = %manifest.id, dir = %dir.display(), "Plugin library not found");
        }

        ModuleMetadata {
            id: if manifest.id.is_empty() {
                dir_name
            } else {
                manifest.id
            },
            name: manifest.name,
            description: manifest.description,
            version: manifest.version,
            file: library.unwrap_or_else(|| dir.to_path_buf()),
            enabled_by_default: manifest.enabled_by_default,
            valid,
        }
    }
}

impl ModuleDiscovery for DirectoryDiscovery {
    fn enumerate_all(&self) -> Vec<ModuleMetadata> {
        let found: Vec<ModuleMetadata> = self
            .search_dirs
            .iter()
            .flat_map(|base_dir| Self::module_dirs(base_dir))
            .map(|dir| Self::read_module(&dir))
            .collect();

        tracing::debug!(count = found.len(), "Discovered plugin modules");
        found
    }
}

/// Find the library file of a module directory
///
/// The manifest's `library` entry wins; otherwise look for `<id>.<ext>` or
/// `lib<id>.<ext>` with the platform's shared library extension.
fn find_library(dir: &Path, manifest: &ModuleManifest) -> Option<PathBuf> {
    if let Some(library) = &manifest.library {
        let path = dir.join(library);
        return path.is_file().then_some(path);
    }

    if manifest.id.is_empty() {
        return None;
    }

    let extensions: &[&str] = if cfg!(target_os = "macos") {
        &["dylib", "so"]
    } else if cfg!(target_os = "windows") {
        &["dll"]
    } else {
        &["so"]
    };

    extensions.iter().find_map(|ext| {
        [
            dir.join(format!("{}.{}", manifest.id, ext)),
            dir.join(format!("lib{}.{}", manifest.id, ext)),
        ]
        .into_iter()
        .find(|path| path.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lib_ext() -> &'static str {
        if cfg!(target_os = "windows") {
            "dll"
        } else {
            "so"
        }
    }

    /// Create `<base>/<dir>/plugin.toml` (and the library it names)
    fn install(base: &Path, dir: &str, manifest: &str, library: Option<&str>) -> PathBuf {
        let module_dir = base.join(dir);
        std::fs::create_dir_all(&module_dir).unwrap();
        std::fs::write(module_dir.join(MANIFEST_FILE), manifest).unwrap();
        if let Some(library) = library {
            std::fs::write(module_dir.join(library), b"").unwrap();
        }
        module_dir
    }

    #[test]
    fn test_missing_search_dir_yields_nothing() {
        let discovery = DirectoryDiscovery::new(vec![PathBuf::from("/nonexistent/plugins")]);
        assert!(discovery.enumerate_all().is_empty());
    }

    #[test]
    fn test_discovers_manifest_with_explicit_library() {
        let dir = TempDir::new().unwrap();
        let module_dir = install(
            dir.path(),
            "screencast",
            "id = \"screencast\"\nlibrary = \"libscreencast.bin\"\nenabled_by_default = true\nname = \"Screencast\"",
            Some("libscreencast.bin"),
        );

        let modules = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]).enumerate_all();

        assert_eq!(modules.len(), 1);
        let m = &modules[0];
        assert_eq!(m.id, "screencast");
        assert_eq!(m.name, "Screencast");
        assert_eq!(m.file, module_dir.join("libscreencast.bin"));
        assert!(m.enabled_by_default);
        assert!(m.valid);
    }

    #[test]
    fn test_library_found_by_naming_convention() {
        let dir = TempDir::new().unwrap();
        let library = format!("libcolord.{}", lib_ext());
        let module_dir = install(dir.path(), "colord", "id = \"colord\"", Some(&library));

        let modules = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]).enumerate_all();

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].file, module_dir.join(library));
        assert!(modules[0].valid);
        assert!(!modules[0].enabled_by_default);
    }

    #[test]
    fn test_missing_library_is_invalid() {
        let dir = TempDir::new().unwrap();
        install(dir.path(), "ghost", "id = \"ghost\"", None);

        let modules = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]).enumerate_all();

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, "ghost");
        assert!(!modules[0].valid);
    }

    #[test]
    fn test_broken_manifest_is_reported_invalid() {
        let dir = TempDir::new().unwrap();
        install(dir.path(), "broken", "this is not toml = = =", None);
        std::fs::create_dir_all(dir.path().join("bare")).unwrap();

        let modules = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]).enumerate_all();

        let ids: Vec<&str> = modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["bare", "broken"]);
        assert!(modules.iter().all(|m| !m.valid));
    }

    #[test]
    fn test_plain_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README"), b"not a module").unwrap();

        let modules = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]).enumerate_all();
        assert!(modules.is_empty());
    }

    #[test]
    fn test_preference_order_is_dir_order_then_path() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        install(user.path(), "a-foo", "id = \"foo\"\nlibrary = \"x\"", Some("x"));
        install(project.path(), "z-foo", "id = \"foo\"\nlibrary = \"x\"", Some("x"));
        install(project.path(), "b-foo", "id = \"foo\"\nlibrary = \"x\"", Some("x"));
        install(project.path(), "bar", "id = \"bar\"\nlibrary = \"x\"", Some("x"));

        let discovery =
            DirectoryDiscovery::new(vec![project.path().to_path_buf(), user.path().to_path_buf()]);
        let foos = discovery.enumerate_by_id("foo");

        let files: Vec<PathBuf> = foos.iter().map(|m| m.file.clone()).collect();
        assert_eq!(
            files,
            vec![
                project.path().join("b-foo/x"),
                project.path().join("z-foo/x"),
                user.path().join("a-foo/x"),
            ]
        );
    }

    #[test]
    fn test_enumerate_by_unknown_id_is_empty() {
        let dir = TempDir::new().unwrap();
        install(dir.path(), "bar", "id = \"bar\"\nlibrary = \"x\"", Some("x"));

        let discovery = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]);
        assert!(discovery.enumerate_by_id("foo").is_empty());
    }

    #[test]
    fn test_enumeration_is_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let discovery = DirectoryDiscovery::new(vec![dir.path().to_path_buf()]);

        assert!(discovery.enumerate_all().is_empty());
        install(dir.path(), "late", "id = \"late\"\nlibrary = \"x\"", Some("x"));
        assert_eq!(discovery.enumerate_all().len(), 1);
    }
}
