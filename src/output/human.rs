//! Human-friendly output implementation using `console` styles.

use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::error::VtError;
use crate::snapshot::{Quarantine, RemoveReport, RestoreReport, ScanReport, Snapshot};
use crate::theme::VtTheme;

use super::{BuildInfo, ConfigInfo, Output, format_modified, format_size};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: VtTheme,
    quiet: bool,
}

impl HumanOutput {
    #[instrument]
    pub fn new(colors: bool, quiet: bool) -> Self {
        debug!("Creating HumanOutput");
        Self {
            theme: VtTheme::new(colors),
            quiet,
        }
    }

    fn field(&self, name: &str, value: &str) {
        println!(
            "  {}{}",
            self.theme.label.apply_to(format!("{name:<14}")),
            self.theme.value.apply_to(value)
        );
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &VtError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!("{}: {error}", self.theme.error.apply_to("Error"));
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!("{}: {suggestion}", self.theme.warning.apply_to("Hint"));
        }
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.theme.accent.apply_to("[INFO]"));
    }

    #[instrument(skip(self, snapshot), fields(timestamp = %snapshot.timestamp))]
    fn snapshot_saved(&self, snapshot: &Snapshot) {
        self.success(&format!(
            "Saved version {} of {} ({})",
            self.theme.timestamp.apply_to(&snapshot.timestamp),
            snapshot.file_name,
            format_size(snapshot.file_size)
        ));
        if !self.quiet {
            println!("  {}", self.theme.path.apply_to(snapshot.version_path.display()));
        }
    }

    fn save_cancelled(&self, path: &Path) {
        self.info(&format!("Save of {} cancelled", path.display()));
    }

    #[instrument(skip(self, snapshots), fields(count = snapshots.len()))]
    fn snapshot_list(&self, path: &Path, snapshots: &[Snapshot]) {
        debug!("Outputting version list");
        if snapshots.is_empty() {
            println!("No saved versions of {}", path.display());
            return;
        }

        println!(
            "{}\n",
            self.theme
                .header
                .apply_to(format!("Versions of {} (newest first)", path.display()))
        );
        println!(
            "  {}",
            self.theme.label.apply_to(format!(
                "{:<24} {:>10}  {:<16}  {}",
                "SAVED", "SIZE", "MODIFIED", "COMMENT"
            ))
        );
        for snapshot in snapshots {
            trace!(timestamp = %snapshot.timestamp, "Listing version");
            println!(
                "  {} {:>10}  {:<16}  {}",
                self.theme
                    .timestamp
                    .apply_to(format!("{:<24}", snapshot.timestamp.to_string())),
                format_size(snapshot.file_size),
                format_modified(&snapshot.file_modified),
                self.theme.comment.apply_to(&snapshot.comment)
            );
            println!(
                "  {}",
                self.theme.muted.apply_to(snapshot.version_path.display())
            );
        }
    }

    fn snapshot_restored(&self, report: &RestoreReport) {
        self.success(&format!(
            "Restored {} from {}",
            report.destination.display(),
            report.version_path.display()
        ));
        if let Some(backup) = &report.backup {
            self.info(&format!("Previous contents kept in {}", backup.display()));
        }
    }

    fn snapshot_removed(&self, report: &RemoveReport) {
        self.success(&format!("Removed version {}", report.snapshot_dir.display()));
    }

    fn reindex_report(&self, report: &ScanReport, indexed: usize) {
        self.success(&format!(
            "Index holds {indexed} versions ({} added from disk)",
            report.added.len()
        ));
        if self.quiet {
            return;
        }
        for path in &report.added {
            println!("  {} {}", self.theme.success.apply_to("+"), path.display());
        }
        for skipped in &report.skipped {
            println!(
                "  {} {} ({})",
                self.theme.warning.apply_to("skipped"),
                skipped.path.display(),
                self.theme.muted.apply_to(&skipped.reason)
            );
        }
        for root in &report.missing_roots {
            self.warning(&format!("Storage location unavailable: {}", root.display()));
        }
    }

    fn quarantined(&self, records: &[Quarantine]) {
        for record in records {
            self.warning(&format!(
                "{} was unreadable ({}); moved to {}",
                record.original.display(),
                record.reason,
                record.moved_to.display()
            ));
        }
    }

    fn config_info(&self, info: &ConfigInfo) {
        println!("{}\n", self.theme.header.apply_to("Configuration"));
        let config = info
            .config_path
            .as_ref()
            .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string());
        self.field("Config file", &config);
        self.field("Storage root", &info.storage_root.display().to_string());
        self.field(
            "Identity",
            &format!("{} ({})", info.identity, info.identity_guarantee),
        );
        self.field("Backup suffix", &info.backup_suffix);
        self.field("Prompt comment", if info.prompt_for_comment { "yes" } else { "no" });
        self.field("Versions", &info.indexed_versions.to_string());

        if !info.alternate_roots.is_empty() {
            println!("\n  {}", self.theme.label.apply_to("Alternate roots"));
            for root in &info.alternate_roots {
                let marker = if root.is_dir() { "" } else { " (unavailable)" };
                println!("    {}{marker}", root.display());
            }
        }
    }

    fn config_path(&self, path: Option<&Path>) {
        match path {
            Some(path) => println!("{}", path.display()),
            None => println!("(no configuration directory)"),
        }
    }

    fn version_info(&self, info: &BuildInfo) {
        println!(
            "{} {}",
            self.theme.accent.apply_to("vt"),
            self.theme.value.apply_to(info.version)
        );
        let dirty = if info.git_dirty { " (dirty)" } else { "" };
        self.field("Git SHA", &format!("{}{dirty}", info.git_sha));
        self.field("Built", info.build_timestamp);
        self.field("Rust", info.rustc_version);
        self.field("Target", info.target);
    }

    fn quick_start(&self, version: &str) {
        println!(
            "{} {version} - file version tracker\n",
            self.theme.accent.apply_to("vt")
        );

        println!("{}\n", self.theme.header.apply_to("QUICK START"));
        let line = |cmd: &str, what: &str| {
            println!("  {}  {what}", self.theme.success.apply_to(format!("{cmd:<40}")));
        };
        line("vt save notes.txt first draft", "Save a version with a comment");
        line("vt save notes.txt --location /media/usb", "Save to another drive");
        line("vt view notes.txt", "List versions, newest first");
        line("vt restore notes.txt <version path>", "Restore (keeps a .backup)");
        line("vt remove notes.txt <version path>", "Delete a version");
        line("vt reindex", "Rebuild the index from disk");
        println!();

        println!("{}\n", self.theme.header.apply_to("ROBOT MODE"));
        println!("  {}  JSON output", self.theme.accent.apply_to("vt --robot <command>"));
        println!();
        println!("Run {} for full help", self.theme.warning.apply_to("vt --help"));
    }
}
