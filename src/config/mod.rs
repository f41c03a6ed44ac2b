//! Configuration for the version tracker.
//!
//! Handles the optional `config.toml` file and the path rules used to locate
//! storage roots.

mod path;
mod settings;

pub use path::{
    alternate_storage_root, default_config_path, default_storage_root, home_dir, resolve_path,
};
pub use settings::{DEFAULT_BACKUP_SUFFIX, Settings};
