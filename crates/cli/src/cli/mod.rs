//! CLI module - Command-line interface for the tooling.
//!
//! Provides commands for:
//! - `db` - Test database lifecycle
//! - `develop` - Development environment setup
//! - `deploy` - Package build and upload

pub mod args;

pub use args::{Cli, Commands};
