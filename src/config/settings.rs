//! User settings loaded from `config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::path::{default_config_path, default_storage_root, resolve_path};
use crate::error::{IoResultExt, Result, VtError};
use crate::identity::IdentityStrategy;

/// Default suffix appended to a file name when restore backs it up.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".backup";

/// Settings as written in the configuration file.
///
/// ```toml
/// storage_root = "~/.versiontracker"
/// identity = "auto"
/// backup_suffix = ".backup"
/// prompt_for_comment = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default storage root. `None` means `~/.versiontracker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,
    /// How file identity is derived.
    pub identity: IdentityStrategy,
    /// Suffix for the backup written before a restore overwrites a file.
    pub backup_suffix: String,
    /// Prompt for a comment on `save` when none is given and stdin is a TTY.
    pub prompt_for_comment: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_root: None,
            identity: IdentityStrategy::Auto,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            prompt_for_comment: true,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// Relative `storage_root` values are resolved against `base_dir`.
    pub fn from_toml(text: &str, base_dir: &Path) -> Result<Self> {
        let mut settings: Self =
            toml::from_str(text).map_err(|e| VtError::ConfigParse(e.to_string()))?;

        if settings.backup_suffix.is_empty() {
            return Err(VtError::ConfigParse(
                "backup_suffix must not be empty".to_string(),
            ));
        }

        if let Some(root) = settings.storage_root.take() {
            settings.storage_root = Some(resolve_path(&root, base_dir)?);
        }
        Ok(settings)
    }

    /// Loads settings from an explicit file. The file must exist.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VtError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let text = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let settings = Self::from_toml(&text, base_dir)?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(settings)
    }

    /// Loads settings from `explicit` if given, else from the default config
    /// path when that file exists, else built-in defaults.
    ///
    /// Returns the settings and the file they came from, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        match default_config_path() {
            Ok(path) if path.is_file() => Ok((Self::load(&path)?, Some(path))),
            _ => {
                debug!("No configuration file, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Returns the effective default storage root.
    ///
    /// An override (from `--root` / `VT_ROOT`) wins over the config file.
    pub fn effective_root(&self, override_root: Option<&Path>) -> Result<PathBuf> {
        match (override_root, &self.storage_root) {
            (Some(root), _) => {
                let cwd = std::env::current_dir().io_context(|| "Failed to read current directory")?;
                resolve_path(root, &cwd)
            }
            (None, Some(root)) => Ok(root.clone()),
            (None, None) => default_storage_root(),
        }
    }
}
