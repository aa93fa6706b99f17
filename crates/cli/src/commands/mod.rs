//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module.

pub mod db;
pub mod deploy;
pub mod develop;
