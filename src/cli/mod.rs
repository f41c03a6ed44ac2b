//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// vt - save, list, restore and remove versions of any file.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "vt", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "VT_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: <config dir>/vt/config.toml)
    #[arg(long, global = true, env = "VT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Default storage root, overriding the configuration file
    #[arg(long, global = true, env = "VT_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Versions ===
    /// Save a new version of a file
    Save(SaveArgs),

    /// List saved versions of a file, newest first
    #[command(visible_alias = "list")]
    View(ViewArgs),

    /// Copy a saved version back over a file
    Restore(RestoreArgs),

    /// Delete a saved version
    Remove(RemoveArgs),

    /// Rebuild index entries from the storage directories
    Reindex,

    // === Configuration ===
    /// Show effective configuration and storage roots
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

/// Arguments for saving a version.
///
/// # Examples
///
/// ```bash
/// # Save with a comment
/// vt save notes.txt before rewrite of intro
///
/// # Save to a USB drive instead of ~/.versiontracker
/// vt save notes.txt --location /media/usb
/// ```
#[derive(Parser, Debug)]
pub struct SaveArgs {
    /// File to save a version of
    pub path: PathBuf,

    /// Comment stored with the version (words are joined with spaces)
    pub comment: Vec<String>,

    /// Ask for a storage location on stdin (empty answer cancels)
    #[arg(long, conflicts_with = "location")]
    pub choose_location: bool,

    /// Store the version under DIR/.versiontracker instead of the default root
    #[arg(long, value_name = "DIR")]
    pub location: Option<PathBuf>,
}

impl SaveArgs {
    /// The comment words joined, or `None` if none were given.
    pub fn comment_text(&self) -> Option<String> {
        if self.comment.is_empty() {
            None
        } else {
            Some(self.comment.join(" "))
        }
    }
}

#[derive(Parser, Debug)]
pub struct ViewArgs {
    /// File whose versions to list
    pub path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// File to restore into
    pub path: PathBuf,

    /// Path of the saved version (as printed by `vt view`)
    pub version_path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// File the version belongs to
    pub path: PathBuf,

    /// Path of the saved version (as printed by `vt view`)
    pub version_path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show configuration file path only
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
