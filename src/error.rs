//! Error types for version store operations.

use std::path::Path;

use thiserror::Error;

/// Primary error type for version tracker operations.
#[derive(Error, Debug)]
pub enum VtError {
    // Not-found errors
    #[error("File not found: {path}")]
    SourceNotFound { path: String },

    #[error("Version not found: {path}")]
    SnapshotNotFound { path: String },

    #[error("Storage location not found: {path}")]
    StorageRootNotFound { path: String },

    #[error("Not a saved version: {path}")]
    NotASnapshot { path: String },

    #[error("Refusing to overwrite a saved version: {path}")]
    ProtectedPath { path: String },

    // Identity errors
    #[error("Cannot read identity of '{path}': {reason}")]
    PathUnavailable { path: String, reason: String },

    #[error("File identity is not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    // Index errors
    #[error("Version index at {path} is corrupt and could not be set aside: {reason}")]
    IndexCorrupt { path: String, reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl VtError {
    pub(crate) fn source_not_found(path: &Path) -> Self {
        Self::SourceNotFound {
            path: path.display().to_string(),
        }
    }

    pub(crate) fn snapshot_not_found(path: &Path) -> Self {
        Self::SnapshotNotFound {
            path: path.display().to_string(),
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::SnapshotNotFound { .. }
                | Self::StorageRootNotFound { .. }
                | Self::NotASnapshot { .. }
                | Self::ProtectedPath { .. }
                | Self::PathUnavailable { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::SourceNotFound { .. } => Some("Check the path; only existing files can be saved"),
            Self::SnapshotNotFound { .. } | Self::NotASnapshot { .. } => {
                Some("Run: vt view <file> to list saved versions")
            }
            Self::StorageRootNotFound { .. } => Some("Choose an existing directory"),
            Self::ProtectedPath { .. } => {
                Some("Restore to the original file or a path outside the storage location")
            }
            Self::UnsupportedPlatform(_) => Some("Set identity = \"name\" in config.toml"),
            Self::IndexCorrupt { .. } => Some("Move the index file away, then run: vt reindex"),
            Self::ConfigNotFound { .. } => Some("Check --config or VT_CONFIG"),
            Self::ConfigParse(_) => Some("Run: vt config to see the expected keys"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using VtError.
pub type Result<T> = std::result::Result<T, VtError>;

/// Extension trait for adding context to I/O errors.
pub trait IoResultExt<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| VtError::IoContext {
            context: f().into(),
            source,
        })
    }
}
