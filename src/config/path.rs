//! Path resolution helpers for configuration and storage roots.
//!
//! Supports absolute paths, paths relative to the config file, and "~" home
//! directory expansion.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Result, VtError};
use crate::snapshot::STORE_DIR_NAME;

/// Resolve a path from a config file.
///
/// Resolution rules:
/// 1. Paths starting with `~`: expanded to home directory
/// 2. Absolute paths: used as-is
/// 3. Relative paths: resolved relative to `base_dir`
pub fn resolve_path(path: &Path, base_dir: &Path) -> Result<PathBuf> {
    trace!(
        path = %path.display(),
        base_dir = %base_dir.display(),
        "Resolving path"
    );

    let path_str = path.to_string_lossy();

    if path_str == "~" || path_str.starts_with("~/") {
        let home = home_dir()?;
        let rest = path_str.strip_prefix("~/").unwrap_or("");
        let resolved = if rest.is_empty() {
            home
        } else {
            home.join(rest)
        };
        debug!(
            original = %path.display(),
            resolved = %resolved.display(),
            "Expanded home directory path"
        );
        return Ok(resolved);
    }

    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let resolved = base_dir.join(path);
    debug!(
        original = %path.display(),
        resolved = %resolved.display(),
        "Resolved relative path"
    );
    Ok(resolved)
}

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| VtError::Other("Could not determine home directory".to_string()))
}

/// Returns the default storage root.
///
/// Location: `~/.versiontracker`
pub fn default_storage_root() -> Result<PathBuf> {
    Ok(home_dir()?.join(STORE_DIR_NAME))
}

/// Returns the default configuration file path.
///
/// Location: `<config_dir>/vt/config.toml` (e.g. `~/.config/vt/config.toml`)
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        VtError::Other("Could not determine configuration directory".to_string())
    })?;
    Ok(config_dir.join("vt").join("config.toml"))
}

/// Returns the hidden storage root inside a user-chosen location.
///
/// The chosen location must exist; the hidden subdirectory is created on
/// first save.
pub fn alternate_storage_root(chosen: &Path) -> Result<PathBuf> {
    if !chosen.is_dir() {
        return Err(VtError::StorageRootNotFound {
            path: chosen.display().to_string(),
        });
    }
    let canonical = chosen.canonicalize().map_err(|_| VtError::StorageRootNotFound {
        path: chosen.display().to_string(),
    })?;
    Ok(canonical.join(STORE_DIR_NAME))
}
