//! Plugin host error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, loading or unloading plugins
///
/// None of these cross the [`PluginManager`](super::PluginManager) boundary:
/// the manager logs them and reports a boolean or does nothing.
#[derive(Error, Debug)]
pub enum PluginHostError {
    /// Module metadata is structurally invalid
    #[error("Invalid metadata for '{id}': {reason}")]
    InvalidMetadata { id: String, reason: String },

    /// A plugin with this id is already registered
    #[error("Plugin '{id}' is already loaded")]
    DuplicateIdentifier { id: String },

    /// Interface version mismatch between host and module
    #[error("Plugin '{id}' has mismatching plugin version: host expects {expected}, module has {found}")]
    VersionMismatch { id: String, expected: u32, found: u32 },

    /// The module exposes no factory entry point
    #[error("Failed to get plugin factory for '{id}'")]
    NoFactory { id: String },

    /// The factory produced no usable instance
    #[error("Failed to create plugin '{id}': {reason}")]
    ConstructionFailed { id: String, reason: String },

    /// Unload target is not registered
    #[error("No plugin with the specified id: '{id}'")]
    NotRegistered { id: String },

    /// The backing module could not be opened
    #[error("Failed to resolve module {path}: {reason}")]
    ModuleResolve { path: PathBuf, reason: String },

    /// Settings error (parsing, saving, etc.)
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_mismatch_display() {
        let err = PluginHostError::VersionMismatch {
            id: "screencast".to_string(),
            expected: 1,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("screencast"));
        assert!(msg.contains("expects 1"));
        assert!(msg.contains("has 2"));
    }

    #[test]
    fn test_not_registered_display() {
        let err = PluginHostError::NotRegistered {
            id: "colord".to_string(),
        };
        assert!(err.to_string().contains("colord"));
    }

    #[test]
    fn test_module_resolve_display() {
        let err = PluginHostError::ModuleResolve {
            path: PathBuf::from("/plugins/foo/libfoo.so"),
            reason: "cannot open shared object file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/plugins/foo/libfoo.so"));
        assert!(msg.contains("cannot open"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PluginHostError = io_err.into();
        assert!(matches!(err, PluginHostError::Io(_)));
    }
}
