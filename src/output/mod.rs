//! Output mode abstraction for robot and human output.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::cli::Cli;
use crate::error::VtError;
use crate::snapshot::{Quarantine, RemoveReport, RestoreReport, ScanReport, Snapshot};

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// Effective configuration as shown by `vt config`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigInfo {
    /// Configuration file in use, if any.
    pub config_path: Option<PathBuf>,
    /// Where a configuration file would be read from by default.
    pub default_config_path: Option<PathBuf>,
    pub storage_root: PathBuf,
    pub alternate_roots: Vec<PathBuf>,
    pub identity: String,
    pub identity_guarantee: String,
    pub backup_suffix: String,
    pub prompt_for_comment: bool,
    pub indexed_versions: usize,
}

/// Build information for `vt version`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
    pub target: &'static str,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { colors: bool, quiet: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                colors: !cli.no_color && io::stdout().is_terminal(),
                quiet: cli.quiet,
            }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { colors, quiet } => Box::new(HumanOutput::new(colors, quiet)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &VtError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Version operations
    fn snapshot_saved(&self, snapshot: &Snapshot);
    fn save_cancelled(&self, path: &Path);
    fn snapshot_list(&self, path: &Path, snapshots: &[Snapshot]);
    fn snapshot_restored(&self, report: &RestoreReport);
    fn snapshot_removed(&self, report: &RemoveReport);

    // Index maintenance
    fn reindex_report(&self, report: &ScanReport, indexed: usize);
    fn quarantined(&self, records: &[Quarantine]);

    // Metadata
    fn config_info(&self, info: &ConfigInfo);
    fn config_path(&self, path: Option<&Path>);
    fn version_info(&self, info: &BuildInfo);
    fn quick_start(&self, version: &str);
}

/// Formats a byte count as `B`, `KB` or `MB` with one decimal.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    match bytes {
        b if b < KB => format!("{b} B"),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{:.1} MB", b as f64 / MB as f64),
    }
}

/// Formats a modification time as `YYYY-MM-DD HH:MM`.
pub fn format_modified(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
