//! In-place patching of persisted configuration artifacts.

use std::path::Path;

use regex::Regex;

use crate::error::OrchestrateError;

/// Default locator for the app's network-id declaration.
///
/// The single capture group spans the value slot that gets replaced.
pub const NETWORK_ID_DECLARATION: &str = r"const networkId = '([^']*)';";

/// Replace the value slot of a declaration inside the artifact at `path`.
///
/// `locator` must contain one capture group spanning the current value of a
/// known declaration shape. The artifact is read whole, the first match's
/// group is replaced with `value`, and the result is written back. This is
/// an idempotent overwrite: re-running with the same value produces a
/// byte-identical file.
pub fn patch_declaration(
    path: &Path,
    locator: &Regex,
    value: &str,
) -> Result<(), OrchestrateError> {
    let unreadable = |reason: String| OrchestrateError::ConfigArtifactUnreadable {
        path: path.to_path_buf(),
        reason,
    };
    let not_found = || OrchestrateError::ConfigPatternNotFound {
        path: path.to_path_buf(),
        pattern: locator.as_str().to_string(),
    };

    let contents = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;

    let slot = locator
        .captures(&contents)
        .and_then(|caps| caps.get(1))
        .ok_or_else(not_found)?;

    let mut patched = String::with_capacity(contents.len() + value.len());
    patched.push_str(&contents[..slot.start()]);
    patched.push_str(value);
    patched.push_str(&contents[slot.end()..]);

    std::fs::write(path, &patched).map_err(|e| unreadable(e.to_string()))?;
    tracing::info!(path = %path.display(), value, "Patched configuration artifact");
    Ok(())
}
