//! Common utilities shared across the tooling crates.
//!
//! This crate provides:
//! - Unified error handling
//! - Configuration loaded from the environment
//! - The external command seam
//! - Git lookups and tracing setup

pub mod config;
pub mod error;
pub mod git;
pub mod process;
pub mod telemetry;

pub use config::{db_password_var, RetryPolicy, ToolConfig, ToolPaths};
pub use error::{AppError, AppResult};
pub use process::{run_checked, CommandOutput, CommandRunner, Invocation, SystemRunner};

#[cfg(any(test, feature = "test-utils"))]
pub use process::MockCommandRunner;
