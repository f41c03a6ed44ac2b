//! Version tracker library - save, list, restore and remove versions of files.
//!
//! This library exposes the core of the `vt` CLI for use in tests and other
//! applications.
//!
//! # Modules
//!
//! - `snapshot`: The version store, its index and reconciliation
//! - `identity`: Stable file identity resolvers
//! - `error`: Error types with user-recoverable hints
//! - `config`: Settings file and path handling
//! - `output`: Output mode abstraction (robot/human)
//! - `logging`: tracing subscriber setup
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod output;
pub mod safe_io;
pub mod snapshot;
pub mod theme;
