//! NX-005: Bin selection from a manifest's `bin` map.

use super::error::ExecError;
use super::types::{unscoped, Manifest};

/// Pick the executable to run from `manifest`.
///
/// Precedence: an explicitly requested bin name, then the only bin, then the
/// bin named after the package (scope stripped). Anything else is ambiguous.
pub fn resolve_bin(manifest: &Manifest, requested: Option<&str>) -> Result<String, ExecError> {
    if let Some(name) = requested {
        if manifest.bin.contains_key(name) {
            return Ok(name.to_string());
        }
    }

    if manifest.bin.len() == 1 {
        if let Some((only, _)) = manifest.bin.first() {
            return Ok(only.clone());
        }
    }

    for candidate in [manifest.name.as_str(), unscoped(&manifest.name)] {
        if manifest.bin.contains_key(candidate) {
            return Ok(candidate.to_string());
        }
    }

    Err(ExecError::NoExecutable {
        pkgid: manifest.id(),
    })
}
