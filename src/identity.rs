//! Stable file identity.
//!
//! Versions of "the same" file are grouped by a [`FileIdentity`]. Which files
//! count as the same depends on the resolver selected at startup:
//!
//! | Resolver | Token | Survives rename | Collides |
//! |----------|-------|-----------------|----------|
//! | [`InodeResolver`] (unix) | `<device>-<inode>` | yes, within a volume | never for live files |
//! | [`NameResolver`] | base file name | no | unrelated files sharing a name |
//!
//! Editors that save by writing a temporary file and renaming it over the
//! original give the file a new inode, and so a new identity under
//! [`InodeResolver`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, VtError};

/// Opaque, platform-derived token grouping the versions of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIdentity(String);

impl FileIdentity {
    /// Wraps an already-derived token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string; also the per-identity directory name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strength of the grouping a resolver provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGuarantee {
    /// Filesystem object identifier; renames within a volume keep identity.
    FileObject,
    /// Base name only; renames lose history and equal names collide.
    BaseName,
}

impl IdentityGuarantee {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileObject => "file_object",
            Self::BaseName => "base_name",
        }
    }
}

/// Derives a stable identity for a file path.
///
/// Implementations must be deterministic for a given live file and must not
/// keep the file open after returning.
pub trait IdentityResolver: fmt::Debug + Send + Sync {
    /// Resolve the identity of `path`.
    fn resolve(&self, path: &Path) -> Result<FileIdentity>;

    /// The guarantee this resolver provides.
    fn guarantee(&self) -> IdentityGuarantee;

    /// Short name for logs and `vt config`.
    fn name(&self) -> &'static str;
}

/// Device + inode identity for unix-family platforms.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct InodeResolver;

#[cfg(unix)]
impl IdentityResolver for InodeResolver {
    fn resolve(&self, path: &Path) -> Result<FileIdentity> {
        use std::os::unix::fs::MetadataExt;

        let metadata = std::fs::metadata(path).map_err(|e| VtError::PathUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let identity = FileIdentity(format!("{}-{}", metadata.dev(), metadata.ino()));
        trace!(path = %path.display(), %identity, "Resolved inode identity");
        Ok(identity)
    }

    fn guarantee(&self) -> IdentityGuarantee {
        IdentityGuarantee::FileObject
    }

    fn name(&self) -> &'static str {
        "inode"
    }
}

/// Base-name identity, available everywhere.
///
/// Does not require the file to exist, so history of a deleted file can still
/// be listed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameResolver;

impl IdentityResolver for NameResolver {
    fn resolve(&self, path: &Path) -> Result<FileIdentity> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| VtError::PathUnavailable {
                path: path.display().to_string(),
                reason: "path has no UTF-8 file name".to_string(),
            })?;
        Ok(FileIdentity(name.to_string()))
    }

    fn guarantee(&self) -> IdentityGuarantee {
        IdentityGuarantee::BaseName
    }

    fn name(&self) -> &'static str {
        "name"
    }
}

/// Identity strategy selected in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// Inode identity where the platform has it, else base name.
    #[default]
    Auto,
    /// Device + inode; an error on platforms without it.
    Inode,
    /// Base file name.
    Name,
}

impl IdentityStrategy {
    /// Builds the resolver for this strategy on the current platform.
    pub fn resolver(self) -> Result<Box<dyn IdentityResolver>> {
        let resolver: Box<dyn IdentityResolver> = match self {
            Self::Name => Box::new(NameResolver),
            #[cfg(unix)]
            Self::Auto | Self::Inode => Box::new(InodeResolver),
            #[cfg(not(unix))]
            Self::Auto => Box::new(NameResolver),
            #[cfg(not(unix))]
            Self::Inode => {
                return Err(VtError::UnsupportedPlatform(format!(
                    "inode identity is unavailable on {}",
                    std::env::consts::OS
                )));
            }
        };
        debug!(strategy = ?self, resolver = resolver.name(), "Identity resolver selected");
        Ok(resolver)
    }
}
