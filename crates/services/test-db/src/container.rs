//! Container engine CLI wrapper.

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use common::{AppError, AppResult, CommandOutput, CommandRunner, Invocation};
use domain::DEFAULT_PG_PORT;

/// Daemon response for a container that does not exist
const NO_SUCH_CONTAINER: &str = "No such container";

/// Daemon response for a container that exists but is stopped
const NOT_RUNNING: &str = "is not running";

/// Where the image definition comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Build context directory containing a Dockerfile
    Directory(PathBuf),
    /// Dockerfile contents piped on stdin, no build context
    Inline(&'static str),
}

/// Thin wrapper over the `docker` CLI.
#[derive(Clone)]
pub struct ContainerEngine {
    runner: Arc<dyn CommandRunner>,
    docker: String,
}

impl ContainerEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: impl Into<String>) -> Self {
        Self {
            runner,
            docker: docker.into(),
        }
    }

    /// Build `tag` from the given source.
    pub async fn build_image(&self, tag: &str, source: &ImageSource) -> AppResult<()> {
        let base = Invocation::new(&self.docker).args(["build", "--rm", "-t", tag]);
        let invocation = match source {
            ImageSource::Directory(dir) => base.arg(dir.to_string_lossy()),
            ImageSource::Inline(dockerfile) => base.arg("-").stdin(dockerfile.as_bytes()),
        };

        tracing::info!(image = tag, "Building database image");
        self.checked(&invocation).await.map(|_| ())
    }

    /// Start a detached PostgreSQL container published on `host_port`.
    pub async fn run_detached(&self, image: &str, name: &str, host_port: u16) -> AppResult<()> {
        let invocation = Invocation::new(&self.docker).args([
            "run".to_string(),
            "-d".to_string(),
            "-p".to_string(),
            format!("{}:{}", host_port, DEFAULT_PG_PORT),
            "--name".to_string(),
            name.to_string(),
            image.to_string(),
        ]);

        tracing::info!(container = name, port = host_port, "Starting database container");
        self.checked(&invocation).await.map(|_| ())
    }

    /// Ask the server inside the container whether it accepts connections.
    pub async fn server_ready(&self, name: &str, user: &str) -> bool {
        let invocation = Invocation::new(&self.docker).args(["exec", name, "pg_isready", "-U", user]);
        match self.runner.run(&invocation).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!(container = name, error = %e, "Readiness check could not run");
                false
            }
        }
    }

    /// Kill and remove a container.
    ///
    /// Returns `false` when the container did not exist. Never fails for a
    /// missing or already stopped container.
    pub async fn remove(&self, name: &str) -> AppResult<bool> {
        let kill = Invocation::new(&self.docker).args(["kill", name]);
        let killed = self.runner.run(&kill).await?;
        if !killed.success() {
            if killed.mentions(NO_SUCH_CONTAINER) {
                tracing::info!(container = name, "Container does not exist, nothing to stop");
                return Ok(false);
            }
            if !killed.mentions(NOT_RUNNING) {
                return Err(engine_failure(&kill, &killed));
            }
            tracing::debug!(container = name, "Container was not running");
        }

        let rm = Invocation::new(&self.docker).args(["rm", "-f", name]);
        let removed = self.runner.run(&rm).await?;
        if !removed.success() {
            if removed.mentions(NO_SUCH_CONTAINER) {
                return Ok(false);
            }
            return Err(engine_failure(&rm, &removed));
        }

        tracing::info!(container = name, "Container removed");
        Ok(true)
    }

    async fn checked(&self, invocation: &Invocation) -> AppResult<CommandOutput> {
        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(engine_failure(invocation, &output))
        }
    }
}

fn engine_failure(invocation: &Invocation, output: &CommandOutput) -> AppError {
    AppError::container_engine(format!(
        "`{}` exited with {:?}: {}",
        invocation,
        output.code,
        output.stderr.trim()
    ))
}

/// Ask the OS for a currently unused local port.
pub fn find_free_port() -> AppResult<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}
