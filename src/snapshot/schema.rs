//! Snapshot data types.
//!
//! [`SnapshotMetadata`] is the per-snapshot `metadata.json` record,
//! [`IndexEntry`] is the flattened form persisted in `index.json`, and
//! [`Snapshot`] is what the store hands back to callers.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::VtError;
use crate::identity::FileIdentity;

/// `strftime` format of snapshot directory names, in local time.
///
/// Local stamps can go backwards when clocks fall back, so ordering of
/// versions uses the recorded `saved_at` instant and only falls back to the
/// stamp on equal instants.
pub const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

const STAMP_BASE_LEN: usize = "YYYY-MM-DDTHH-MM-SS".len();

/// Sortable, filesystem-safe snapshot directory name.
///
/// A second save within the same second for the same identity gets a counter
/// suffix: `2026-10-16T09-30-00`, `2026-10-16T09-30-00-1`, ... Ordering is by
/// base timestamp, then numerically by counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotStamp {
    base: String,
    counter: u32,
}

impl SnapshotStamp {
    /// Stamp for `at` with no collision counter.
    pub fn at(at: DateTime<Local>) -> Self {
        Self {
            base: at.format(STAMP_FORMAT).to_string(),
            counter: 0,
        }
    }

    /// The same base timestamp with a collision counter.
    #[must_use]
    pub fn with_counter(&self, counter: u32) -> Self {
        Self {
            base: self.base.clone(),
            counter,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl fmt::Display for SnapshotStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counter == 0 {
            f.write_str(&self.base)
        } else {
            write!(f, "{}-{}", self.base, self.counter)
        }
    }
}

impl FromStr for SnapshotStamp {
    type Err = VtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VtError::Other(format!("Invalid snapshot timestamp '{s}'"));

        let base = s.get(..STAMP_BASE_LEN).ok_or_else(invalid)?;
        chrono::NaiveDateTime::parse_from_str(base, STAMP_FORMAT).map_err(|_| invalid())?;

        let counter = match &s[STAMP_BASE_LEN..] {
            "" => 0,
            rest => rest
                .strip_prefix('-')
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(invalid)?,
        };

        Ok(Self {
            base: base.to_string(),
            counter,
        })
    }
}

impl TryFrom<String> for SnapshotStamp {
    type Error = VtError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SnapshotStamp> for String {
    fn from(stamp: SnapshotStamp) -> Self {
        stamp.to_string()
    }
}

impl Ord for SnapshotStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base
            .cmp(&other.base)
            .then(self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for SnapshotStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Contents of `<root>/<identity>/<timestamp>/metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(with = "iso8601")]
    pub saved_at: DateTime<Local>,
    pub file_size: u64,
    #[serde(with = "iso8601")]
    pub file_modified: DateTime<Local>,
    #[serde(default)]
    pub comment: String,
    /// Missing in records written before identities existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<FileIdentity>,
    /// Missing in records written before identities existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Absolute path of the source file at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
}

/// One flattened record of `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub file_id: FileIdentity,
    pub file_name: String,
    pub version_file_path: PathBuf,
    pub timestamp: SnapshotStamp,
    #[serde(default)]
    pub comment: String,
    pub storage_location: PathBuf,
    pub metadata_path: PathBuf,
    #[serde(with = "iso8601")]
    pub saved_at: DateTime<Local>,
    pub file_size: u64,
    #[serde(with = "iso8601")]
    pub file_modified: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
}

/// A saved version of a file, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Identity of the file this is a version of.
    pub file_id: FileIdentity,
    /// Name of the file at capture time.
    pub file_name: String,
    /// Directory name under the identity directory.
    pub timestamp: SnapshotStamp,
    pub saved_at: DateTime<Local>,
    /// Size of the copied bytes.
    pub file_size: u64,
    /// Source modification time at capture.
    pub file_modified: DateTime<Local>,
    pub comment: String,
    /// Path to the copied bytes.
    pub version_path: PathBuf,
    /// Path to `metadata.json`.
    pub metadata_path: PathBuf,
    /// Storage root holding the snapshot.
    pub storage_root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
}

impl From<IndexEntry> for Snapshot {
    fn from(entry: IndexEntry) -> Self {
        Self {
            file_id: entry.file_id,
            file_name: entry.file_name,
            timestamp: entry.timestamp,
            saved_at: entry.saved_at,
            file_size: entry.file_size,
            file_modified: entry.file_modified,
            comment: entry.comment,
            version_path: entry.version_file_path,
            metadata_path: entry.metadata_path,
            storage_root: entry.storage_location,
            original_path: entry.original_path,
        }
    }
}

impl From<&Snapshot> for IndexEntry {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            file_id: snapshot.file_id.clone(),
            file_name: snapshot.file_name.clone(),
            version_file_path: snapshot.version_path.clone(),
            timestamp: snapshot.timestamp.clone(),
            comment: snapshot.comment.clone(),
            storage_location: snapshot.storage_root.clone(),
            metadata_path: snapshot.metadata_path.clone(),
            saved_at: snapshot.saved_at,
            file_size: snapshot.file_size,
            file_modified: snapshot.file_modified,
            original_path: snapshot.original_path.clone(),
        }
    }
}

/// ISO-8601 timestamps.
///
/// Written as RFC 3339 with offset. Read either with an offset or naive
/// (`2026-10-16T09:30:00.123456`), a naive value being local time.
mod iso8601 {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Local>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Ok(dt.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| D::Error::custom(format!("invalid ISO-8601 timestamp '{s}': {e}")))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| D::Error::custom(format!("nonexistent local time '{s}'")))
    }
}
