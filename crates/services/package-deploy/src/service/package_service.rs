//! Package service - development environments and deployments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use common::{git, run_checked, AppError, AppResult, CommandRunner, Invocation, SystemRunner, ToolConfig};
use domain::PackageInfo;

use crate::build::{BuildKind, Builder};
use crate::inference::infer_package;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Options for [`PackageService::deploy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Upload the artifact after building
    pub upload: bool,
    /// Skip the build when the artifact already exists locally
    pub skip_existing: bool,
    /// Package name to use instead of the inferred one
    pub package_name: Option<String>,
    /// Upload for all platforms
    pub all: bool,
}

/// Outcome of [`PackageService::develop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevelopReport {
    pub env_name: String,
    pub package: PackageInfo,
    pub artifact: PathBuf,
}

/// Package service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PackageService: Send + Sync {
    /// Create a conda environment holding the repository's dependencies.
    ///
    /// The environment is named after the checked-out ref unless `env_name`
    /// is given.
    async fn develop(&self, repo: &Path, env_name: Option<String>) -> AppResult<DevelopReport>;

    /// Build the repository's package, optionally uploading it.
    async fn deploy(&self, repo: &Path, options: DeployOptions) -> AppResult<PathBuf>;
}

/// [`PackageService`] driving conda, python and anaconda through a [`CommandRunner`].
pub struct PackageManager {
    runner: Arc<dyn CommandRunner>,
    config: ToolConfig,
    builder: Builder,
}

impl PackageManager {
    pub fn new(runner: Arc<dyn CommandRunner>, config: ToolConfig) -> Self {
        let builder = Builder::new(runner.clone(), config.tools.clone());
        Self {
            runner,
            config,
            builder,
        }
    }

    pub fn with_system_tools(config: ToolConfig) -> Self {
        Self::new(Arc::new(SystemRunner::new()), config)
    }

    /// Run a dependency installation step, reporting any failure as
    /// [`AppError::DependencyInstallFailed`].
    async fn install_step(&self, invocation: Invocation) -> AppResult<()> {
        match run_checked(self.runner.as_ref(), &invocation).await {
            Ok(_) => Ok(()),
            Err(e @ AppError::ScriptExecutionFailed { .. }) | Err(e @ AppError::Spawn { .. }) => {
                Err(AppError::DependencyInstallFailed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Upload token and channel.
    fn upload_credentials(&self) -> AppResult<(&str, &str)> {
        let token = self
            .config
            .anaconda_token()
            .ok_or_else(|| AppError::config("ANACONDA_TOKEN must be set to upload"))?;
        let channel = self
            .config
            .package_channel
            .as_deref()
            .ok_or_else(|| AppError::config("PACKAGE_CHANNEL must be set to upload"))?;
        Ok((token, channel))
    }

    fn upload_invocation(
        &self,
        artifact: &Path,
        options: &DeployOptions,
    ) -> AppResult<Invocation> {
        let (token, channel) = self.upload_credentials()?;

        let mut invocation = Invocation::new(&self.config.tools.anaconda)
            .arg("-t")
            .secret_arg(token)
            .args(["upload", "--force", "-u", channel]);
        if let Some(name) = &options.package_name {
            invocation = invocation.args(["--package", name.as_str()]);
        }
        if options.all {
            invocation = invocation.arg("--all");
        }
        Ok(invocation.arg(artifact.to_string_lossy()))
    }
}

#[async_trait]
impl PackageService for PackageManager {
    async fn develop(&self, repo: &Path, env_name: Option<String>) -> AppResult<DevelopReport> {
        let env_name = match env_name {
            Some(name) => name,
            None => git::describe_head(self.runner.as_ref(), &self.config.tools.git, repo).await?,
        };
        let package = infer_package(self.runner.as_ref(), &self.config, repo, None).await?;
        let conda = self.config.tools.conda.as_str();

        tracing::info!(env = %env_name, package = %package, "Creating development environment");
        self.install_step(
            Invocation::new(conda).args(["create", "-y", "-n", env_name.as_str(), "python"]),
        )
        .await?;

        let artifact = self.builder.build(repo, &package, true).await?;

        let install = match BuildKind::detect(repo).await {
            BuildKind::Conda => Invocation::new(conda).args([
                "install",
                "-y",
                "-n",
                env_name.as_str(),
                "--use-local",
                "--only-deps",
                package.name.as_str(),
            ]),
            BuildKind::Generic => Invocation::new(conda)
                .args(["run", "-n", env_name.as_str()])
                .args([self.config.tools.python.as_str(), "-m", "pip", "install"])
                .arg(artifact.to_string_lossy()),
        };
        self.install_step(install.current_dir(repo)).await?;

        tracing::info!(env = %env_name, "Development environment ready");
        Ok(DevelopReport {
            env_name,
            package,
            artifact,
        })
    }

    async fn deploy(&self, repo: &Path, options: DeployOptions) -> AppResult<PathBuf> {
        let package = infer_package(
            self.runner.as_ref(),
            &self.config,
            repo,
            options.package_name.as_deref(),
        )
        .await?;

        if options.upload {
            self.upload_credentials()?;
        }

        let artifact = self
            .builder
            .build(repo, &package, options.skip_existing)
            .await?;

        if options.upload {
            let upload = self.upload_invocation(&artifact, &options)?;
            tracing::info!(package = %package, artifact = %artifact.display(), "Uploading package");
            run_checked(self.runner.as_ref(), &upload).await?;
        }

        Ok(artifact)
    }
}
