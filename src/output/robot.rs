//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, error, instrument, trace};

use crate::error::VtError;
use crate::snapshot::{Quarantine, RemoveReport, RestoreReport, ScanReport, Snapshot};

use super::{BuildInfo, ConfigInfo, Output, RobotFormat};

/// JSON output implementation for scripting.
///
/// Results go to stdout, errors and warnings to stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let result = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match result {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize output");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    /// Output JSON to stderr.
    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &VtError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    fn warning(&self, message: &str) {
        self.output_json_stderr(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    fn info(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    fn snapshot_saved(&self, snapshot: &Snapshot) {
        self.output_json(&serde_json::json!({
            "command": "save",
            "ok": true,
            "cancelled": false,
            "version": snapshot,
        }));
    }

    fn save_cancelled(&self, path: &Path) {
        self.output_json(&serde_json::json!({
            "command": "save",
            "ok": true,
            "cancelled": true,
            "path": path,
        }));
    }

    #[instrument(skip(self, snapshots), fields(count = snapshots.len()))]
    fn snapshot_list(&self, path: &Path, snapshots: &[Snapshot]) {
        debug!("Robot: snapshot_list");
        self.output_json(&serde_json::json!({
            "command": "view",
            "path": path,
            "count": snapshots.len(),
            "versions": snapshots,
        }));
    }

    fn snapshot_restored(&self, report: &RestoreReport) {
        self.output_json(&serde_json::json!({
            "command": "restore",
            "ok": true,
            "version_path": report.version_path,
            "destination": report.destination,
            "backup": report.backup,
        }));
    }

    fn snapshot_removed(&self, report: &RemoveReport) {
        self.output_json(&serde_json::json!({
            "command": "remove",
            "ok": true,
            "version_path": report.version_path,
            "snapshot_dir": report.snapshot_dir,
            "was_indexed": report.snapshot.is_some(),
        }));
    }

    fn reindex_report(&self, report: &ScanReport, indexed: usize) {
        self.output_json(&serde_json::json!({
            "command": "reindex",
            "ok": true,
            "indexed": indexed,
            "scan": report,
        }));
    }

    fn quarantined(&self, records: &[Quarantine]) {
        for record in records {
            self.output_json_stderr(&serde_json::json!({
                "warning": true,
                "message": "index document was unreadable and has been moved aside",
                "quarantine": record,
            }));
        }
    }

    fn config_info(&self, info: &ConfigInfo) {
        self.output_json(info);
    }

    fn config_path(&self, path: Option<&Path>) {
        self.output_json(&serde_json::json!({ "config_path": path }));
    }

    fn version_info(&self, info: &BuildInfo) {
        self.output_json(info);
    }

    fn quick_start(&self, version: &str) {
        self.output_json(&serde_json::json!({
            "tool": "vt",
            "version": version,
            "description": "Save, list, restore and remove versions of any file",
            "commands": {
                "save": "vt save <PATH> [COMMENT...] [--location DIR | --choose-location]",
                "view": "vt view <PATH>",
                "restore": "vt restore <PATH> <VERSION_PATH>",
                "remove": "vt remove <PATH> <VERSION_PATH>",
                "reindex": "vt reindex",
                "config": "vt config",
            },
            "output_modes": {
                "human": "--format=text (default)",
                "robot": "--robot or --format=json",
                "compact": "--format=json-compact",
            },
            "environment": {
                "VT_ROOT": "default storage root",
                "VT_CONFIG": "configuration file",
                "VT_FORMAT": "output format",
            },
        }));
    }
}
