//! Version gate - exact interface version match before instantiation

use plughost_api::PLUGIN_API_VERSION;

use super::error::PluginHostError;

/// Check a module's declared interface version against the host's.
///
/// The interface is a binary contract, so only an exact match passes.
pub fn check_version(id: &str, found: u32) -> Result<(), PluginHostError> {
    if found != PLUGIN_API_VERSION {
        return Err(PluginHostError::VersionMismatch {
            id: id.to_string(),
            expected: PLUGIN_API_VERSION,
            found,
        });
    }
    Ok(())
}
