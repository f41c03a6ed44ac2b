//! vt - save, list, restore and remove versions of any file.
//!
//! Provides both human-friendly and robot-mode (JSON) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;

use vt::cli::{self, Cli, Commands};
use vt::config::{Settings, default_config_path, resolve_path};
use vt::error::{IoResultExt, Result};
use vt::logging::init_logging;
use vt::output::{BuildInfo, ConfigInfo, Output, OutputMode};
use vt::snapshot::{SaveOutcome, StoreOptions, VersionStore};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> bool {
        option_env!("VERGEN_GIT_DIRTY") == Some("true")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let output = OutputMode::from_cli(&cli).into_output();

    if let Err(e) = run(&cli, output.as_ref()) {
        output.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    match &cli.command {
        None => {
            output.quick_start(build_info::VERSION);
            Ok(())
        }
        Some(Commands::Save(args)) => cmd_save(cli, output, args),
        Some(Commands::View(args)) => cmd_view(cli, output, args),
        Some(Commands::Restore(args)) => cmd_restore(cli, output, args),
        Some(Commands::Remove(args)) => cmd_remove(cli, output, args),
        Some(Commands::Reindex) => cmd_reindex(cli, output),
        Some(Commands::Config(args)) => cmd_config(cli, output, args),
        Some(Commands::Version) => {
            cmd_version(output);
            Ok(())
        }
        Some(Commands::Completions(args)) => {
            cmd_completions(args);
            Ok(())
        }
    }
}

/// Loads settings and opens the store, surfacing quarantined index documents.
fn open_store(cli: &Cli, output: &dyn Output) -> Result<(VersionStore, Settings, Option<PathBuf>)> {
    let (settings, config_path) = Settings::discover(cli.config.as_deref())?;
    let options = StoreOptions::from_settings(&settings, cli.root.as_deref())?;
    let store = VersionStore::open(options)?;
    output.quarantined(store.quarantined());
    Ok((store, settings, config_path))
}

// === Version commands ===

fn cmd_save(cli: &Cli, output: &dyn Output, args: &cli::SaveArgs) -> Result<()> {
    let (mut store, settings, _) = open_store(cli, output)?;

    let location = if args.choose_location {
        let answer = prompt("Storage location (empty to cancel): ")?;
        if answer.is_empty() {
            Some(PathBuf::new())
        } else {
            let cwd = std::env::current_dir().io_context(|| "Failed to read current directory")?;
            Some(resolve_path(Path::new(&answer), &cwd)?)
        }
    } else {
        args.location.clone()
    };

    // No point asking for a comment on a save that will not happen.
    let cancelled = location.as_ref().is_some_and(|l| l.as_os_str().is_empty());

    let comment = match args.comment_text() {
        Some(comment) => comment,
        None if !cancelled
            && settings.prompt_for_comment
            && !cli.use_json()
            && io::stdin().is_terminal() =>
        {
            prompt("Comment (optional): ")?
        }
        None => String::new(),
    };

    match store.save(&args.path, &comment, location.as_deref())? {
        SaveOutcome::Saved(snapshot) => output.snapshot_saved(&snapshot),
        SaveOutcome::Cancelled => output.save_cancelled(&args.path),
    }
    Ok(())
}

fn cmd_view(cli: &Cli, output: &dyn Output, args: &cli::ViewArgs) -> Result<()> {
    let (store, _, _) = open_store(cli, output)?;
    let snapshots = store.list(&args.path);
    output.snapshot_list(&args.path, &snapshots);
    Ok(())
}

fn cmd_restore(cli: &Cli, output: &dyn Output, args: &cli::RestoreArgs) -> Result<()> {
    let (store, _, _) = open_store(cli, output)?;
    warn_if_other_file(&store, output, &args.path, &args.version_path);
    let report = store.restore(&args.version_path, &args.path)?;
    output.snapshot_restored(&report);
    Ok(())
}

fn cmd_remove(cli: &Cli, output: &dyn Output, args: &cli::RemoveArgs) -> Result<()> {
    let (mut store, _, _) = open_store(cli, output)?;
    warn_if_other_file(&store, output, &args.path, &args.version_path);
    let report = store.remove(&args.version_path)?;
    output.snapshot_removed(&report);
    Ok(())
}

/// Warns when `version_path` is indexed under a different file than `path`.
fn warn_if_other_file(store: &VersionStore, output: &dyn Output, path: &Path, version_path: &Path) {
    let Some(snapshot) = store.find(version_path) else {
        return;
    };
    match store.identity_of(path) {
        Ok(identity) if identity != snapshot.file_id => output.warning(&format!(
            "{} is a version of {}, not of {}",
            version_path.display(),
            snapshot.file_name,
            path.display()
        )),
        Ok(_) => {}
        Err(e) => debug!(error = %e, "Cannot compare identities"),
    }
}

fn cmd_reindex(cli: &Cli, output: &dyn Output) -> Result<()> {
    // Opening the store runs the reconciliation pass.
    let (store, _, _) = open_store(cli, output)?;
    output.reindex_report(store.last_scan(), store.index().len());
    Ok(())
}

// === Configuration ===

fn cmd_config(cli: &Cli, output: &dyn Output, args: &cli::ConfigArgs) -> Result<()> {
    if args.path {
        let path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => default_config_path().ok(),
        };
        output.config_path(path.as_deref());
        return Ok(());
    }

    let (store, settings, config_path) = open_store(cli, output)?;
    let resolver = store.resolver();
    let info = ConfigInfo {
        config_path,
        default_config_path: default_config_path().ok(),
        storage_root: store.root().to_path_buf(),
        alternate_roots: store.index().alternate_roots().map(Path::to_path_buf).collect(),
        identity: resolver.name().to_string(),
        identity_guarantee: resolver.guarantee().as_str().to_string(),
        backup_suffix: store.backup_suffix().to_string(),
        prompt_for_comment: settings.prompt_for_comment,
        indexed_versions: store.index().len(),
    };
    output.config_info(&info);
    Ok(())
}

// === Utilities ===

fn cmd_version(output: &dyn Output) {
    output.version_info(&BuildInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty(),
        build_timestamp: build_info::build_timestamp(),
        rustc_version: build_info::rustc_semver(),
        target: build_info::target(),
    });
}

fn cmd_completions(args: &cli::CompletionsArgs) {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "vt", &mut io::stdout());
}

/// Prints `message` to stderr and reads one trimmed line from stdin.
/// End of input reads as an empty answer.
fn prompt(message: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{message}").io_context(|| "Failed to write prompt")?;
    stderr.flush().io_context(|| "Failed to write prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .io_context(|| "Failed to read answer")?;
    Ok(line.trim().to_string())
}
