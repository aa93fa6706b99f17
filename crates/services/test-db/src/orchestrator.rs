//! Database lifecycle orchestration.
//!
//! Each phase resolves its [`ResolutionChain`] against the calling
//! repository and runs exactly one candidate. Failures abort the phase and
//! propagate; nothing is torn down automatically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{run_checked, AppError, AppResult, CommandRunner, Invocation, ToolConfig};
use domain::{ConnectionDescriptor, DomainError, Phase, DOCKERFILE_PATH};

use crate::chain::{self, Candidate, ResolutionChain, SqlRole};
use crate::container::{ContainerEngine, ImageSource};
use crate::readiness::{poll_until_ready, ConnectionProbe};
use crate::sql::SqlClient;
use crate::template;

/// Sqitch output when the plan has nothing left to apply
const SQITCH_NOTHING_TO_DEPLOY: &str = "Nothing to deploy";

/// Drives the test database lifecycle for one calling repository.
pub struct Orchestrator {
    repo: PathBuf,
    config: ToolConfig,
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn ConnectionProbe>,
    containers: ContainerEngine,
    sql: SqlClient,
    image_name: Option<String>,
}

impl Orchestrator {
    pub fn new(
        repo: impl Into<PathBuf>,
        config: ToolConfig,
        runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn ConnectionProbe>,
    ) -> Self {
        let containers = ContainerEngine::new(runner.clone(), config.tools.docker.clone());
        let sql = SqlClient::new(runner.clone(), config.tools.psql.clone());
        Self {
            repo: repo.into(),
            config,
            runner,
            probe,
            containers,
            sql,
            image_name: None,
        }
    }

    /// Override the image name (defaults to the database name).
    pub fn with_image_name(mut self, image_name: impl Into<String>) -> Self {
        self.image_name = Some(image_name.into());
        self
    }

    /// Launch a database container and prepare it.
    ///
    /// Builds the image, runs the container, waits for the server and for
    /// client connectivity, then runs `setup`. With
    /// `with_migrations_and_test_data`, also runs `migrate` and
    /// `insert_test_data`. Returns the connection URI.
    pub async fn start(
        &self,
        descriptor: &ConnectionDescriptor,
        with_migrations_and_test_data: bool,
    ) -> AppResult<String> {
        let image = format!(
            "{}:latest",
            self.image_name.as_deref().unwrap_or(descriptor.database())
        );
        let container = descriptor.container_name();

        self.containers
            .build_image(&image, &self.image_source())
            .await?;
        self.containers
            .run_detached(&image, &container, descriptor.port())
            .await?;

        self.wait_until_ready(descriptor, &container).await?;

        self.setup(descriptor).await?;
        if with_migrations_and_test_data {
            self.migrate(descriptor).await?;
            self.insert_test_data(descriptor).await?;
        }

        tracing::info!(container = %container, "Database is ready");
        Ok(descriptor.uri())
    }

    /// Provision the owner role and database.
    pub async fn setup(&self, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        self.run_phase(Phase::Setup, descriptor).await
    }

    /// Bring the schema up to date.
    pub async fn migrate(&self, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        self.run_phase(Phase::Migrate, descriptor).await
    }

    /// Load test data. Existing rows are left untouched.
    pub async fn insert_test_data(&self, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        self.run_phase(Phase::InsertTestData, descriptor).await
    }

    /// Return the database to its post-migration state.
    ///
    /// Without a repository override this drops the database and re-runs
    /// `setup` and `migrate`.
    pub async fn reset_data(&self, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        match self.resolve(Phase::ResetData)? {
            Some(Candidate::DropAndRecreate) => {
                self.execute(Phase::ResetData, &Candidate::DropAndRecreate, descriptor)
                    .await?;
                self.setup(descriptor).await?;
                self.migrate(descriptor).await
            }
            Some(candidate) => self.execute(Phase::ResetData, &candidate, descriptor).await,
            None => Ok(()),
        }
    }

    /// Kill and remove the database container. Stopping twice is fine.
    pub async fn stop(&self, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        let container = descriptor.container_name();
        let existed = self.containers.remove(&container).await?;
        tracing::info!(container = %container, existed, "Database stopped");
        Ok(())
    }

    fn image_source(&self) -> ImageSource {
        let dockerfile = self.repo.join(DOCKERFILE_PATH);
        match dockerfile.parent() {
            Some(context) if dockerfile.is_file() => ImageSource::Directory(context.to_path_buf()),
            _ => {
                tracing::info!(
                    repo = %self.repo.display(),
                    "No {} in the repository, using the built-in image",
                    DOCKERFILE_PATH
                );
                ImageSource::Inline(template::DOCKERFILE)
            }
        }
    }

    async fn wait_until_ready(
        &self,
        descriptor: &ConnectionDescriptor,
        container: &str,
    ) -> AppResult<()> {
        let policy = self.config.readiness;

        let containers = &self.containers;
        let admin_user = self.config.admin_user.as_str();
        poll_until_ready("database server", policy, move |_| async move {
            containers.server_ready(container, admin_user).await
        })
        .await?;

        let url = self.admin_target(descriptor).uri();
        let url = url.as_str();
        let probe = self.probe.as_ref();
        poll_until_ready("database client connection", policy, move |_| async move {
            probe.is_ready(url).await
        })
        .await?;

        Ok(())
    }

    fn admin_target(&self, descriptor: &ConnectionDescriptor) -> ConnectionDescriptor {
        descriptor.for_role(
            &self.config.admin_user,
            self.config.admin_password(),
            &self.config.admin_database,
        )
    }

    fn resolve(&self, phase: Phase) -> AppResult<Option<Candidate>> {
        let resolved = ResolutionChain::for_phase(phase, &self.repo)
            .and_then(|chain| chain.resolve().cloned());

        if resolved.is_none() && !phase.is_optional() {
            return Err(AppError::NoCandidate {
                phase,
                repo: self.repo.clone(),
            });
        }
        Ok(resolved)
    }

    async fn run_phase(&self, phase: Phase, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        match self.resolve(phase)? {
            Some(candidate) => self.execute(phase, &candidate, descriptor).await,
            None => {
                tracing::info!(phase = %phase, "Nothing to run, skipping");
                Ok(())
            }
        }
    }

    async fn execute(
        &self,
        phase: Phase,
        candidate: &Candidate,
        descriptor: &ConnectionDescriptor,
    ) -> AppResult<()> {
        tracing::info!(phase = %phase, candidate = %candidate.describe(), "Running phase");

        match candidate {
            Candidate::Executable(path) => {
                if !chain::is_executable(path) {
                    return Err(AppError::ScriptNotExecutable { path: path.clone() });
                }
                let invocation = Invocation::new(path.to_string_lossy())
                    .secret_arg(descriptor.uri())
                    .current_dir(&self.repo)
                    .env("DATABASE_URL", descriptor.uri());
                run_checked(self.runner.as_ref(), &invocation).await?;
            }
            Candidate::SqlFile { path, role } => {
                let script = tokio::fs::read(path).await?;
                let target = match role {
                    SqlRole::Admin => self.admin_target(descriptor),
                    SqlRole::Owner => descriptor.clone(),
                };
                self.sql.run_script(&target, script).await?;
            }
            Candidate::SqitchPlan(dir) => {
                self.sqitch_deploy(dir, descriptor).await?;
            }
            Candidate::TemplateSetup => {
                tracing::debug!(
                    user = descriptor.user(),
                    database = descriptor.database(),
                    "Rendering the built-in setup script"
                );
                let script = template::render_setup_sql(descriptor);
                self.sql
                    .run_script(&self.admin_target(descriptor), script)
                    .await?;
            }
            Candidate::DropAndRecreate => {
                if descriptor.database() == self.config.admin_database {
                    return Err(DomainError::validation(format!(
                        "refusing to drop the maintenance database '{}'",
                        descriptor.database()
                    ))
                    .into());
                }
                let script = template::render_drop_database_sql(descriptor);
                self.sql
                    .run_script(&self.admin_target(descriptor), script)
                    .await?;
            }
        }

        tracing::debug!(phase = %phase, "Phase finished");
        Ok(())
    }

    async fn sqitch_deploy(&self, dir: &Path, descriptor: &ConnectionDescriptor) -> AppResult<()> {
        let invocation = Invocation::new(&self.config.tools.sqitch)
            .args(["--engine", "pg", "deploy"])
            .secret_arg(descriptor.sqitch_target())
            .current_dir(dir);

        let output = self.runner.run(&invocation).await?;
        if output.success() {
            return Ok(());
        }
        if output.mentions(SQITCH_NOTHING_TO_DEPLOY) {
            tracing::info!("Sqitch plan has nothing to deploy");
            return Ok(());
        }
        Err(AppError::script_failed(
            invocation.to_string(),
            output.code,
            output.stderr.trim(),
        ))
    }
}
