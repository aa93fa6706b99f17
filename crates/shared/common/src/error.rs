//! Unified error handling for the tooling crates.
//!
//! Every lifecycle phase and packaging step reports failures through
//! [`AppError`]; the binary maps any error to a non-zero exit code.

use std::path::PathBuf;

use domain::{DomainError, Phase};
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Script resolution and execution
    #[error("`{command}` failed with exit code {}: {stderr}", exit_code_label(.code))]
    ScriptExecutionFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("No {phase} script or fallback was found in '{}'", .repo.display())]
    NoCandidate { phase: Phase, repo: PathBuf },

    #[error("Script '{}' exists but is not executable", .path.display())]
    ScriptNotExecutable { path: PathBuf },

    // Readiness
    #[error("{service} did not become ready after {attempts} attempts")]
    ServiceNotReady { service: String, attempts: u32 },

    // Packaging
    #[error("No version marker found under '{}'", .path.display())]
    MissingVersion { path: PathBuf },

    #[error("Dependency installation failed: {0}")]
    DependencyInstallFailed(String),

    // External tools
    #[error("Container engine error: {0}")]
    ContainerEngine(String),

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Input
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl AppError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ScriptExecutionFailed { .. } => "SCRIPT_EXECUTION_FAILED",
            AppError::NoCandidate { .. } => "NO_CANDIDATE",
            AppError::ScriptNotExecutable { .. } => "SCRIPT_NOT_EXECUTABLE",
            AppError::ServiceNotReady { .. } => "SERVICE_NOT_READY",
            AppError::MissingVersion { .. } => "MISSING_VERSION",
            AppError::DependencyInstallFailed(_) => "DEPENDENCY_INSTALL_FAILED",
            AppError::ContainerEngine(_) => "CONTAINER_ENGINE_ERROR",
            AppError::Spawn { .. } => "SPAWN_FAILED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Domain(_) => "INVALID_INPUT",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the error means a readiness poll ran out of attempts
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::ServiceNotReady { .. })
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn script_failed(
        command: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        AppError::ScriptExecutionFailed {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    pub fn not_ready(service: impl Into<String>, attempts: u32) -> Self {
        AppError::ServiceNotReady {
            service: service.into(),
            attempts,
        }
    }

    pub fn container_engine(msg: impl Into<String>) -> Self {
        AppError::ContainerEngine(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Spawn {
            program: program.into(),
            source,
        }
    }
}
