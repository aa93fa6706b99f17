//! Package builds.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use common::{run_checked, AppError, AppResult, CommandRunner, Invocation, ToolPaths};
use domain::{PackageInfo, CONDA_META_PATH, CONDA_RECIPE_DIR, GENERIC_DIST_DIR};

/// How a repository is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    /// `conda-build/meta.yaml` recipe
    Conda,
    /// `python -m build` wheel into `dist/`
    Generic,
}

impl BuildKind {
    pub async fn detect(repo: &Path) -> Self {
        match tokio::fs::metadata(repo.join(CONDA_META_PATH)).await {
            Ok(metadata) if metadata.is_file() => BuildKind::Conda,
            _ => BuildKind::Generic,
        }
    }
}

/// Runs package builds and reports the produced artifact.
#[derive(Clone)]
pub struct Builder {
    runner: Arc<dyn CommandRunner>,
    tools: ToolPaths,
}

impl Builder {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// Build `package` from `repo` and return the artifact path.
    ///
    /// `VERSION` is exported to the build so recipes can template it.
    pub async fn build(
        &self,
        repo: &Path,
        package: &PackageInfo,
        skip_existing: bool,
    ) -> AppResult<PathBuf> {
        let kind = BuildKind::detect(repo).await;
        tracing::info!(package = %package, kind = ?kind, "Building package");

        let artifact = match kind {
            BuildKind::Conda => self.conda_build(repo, package, skip_existing).await?,
            BuildKind::Generic => self.generic_build(repo, package).await?,
        };

        tracing::info!(artifact = %artifact.display(), "Package built");
        Ok(artifact)
    }

    async fn conda_build(
        &self,
        repo: &Path,
        package: &PackageInfo,
        skip_existing: bool,
    ) -> AppResult<PathBuf> {
        let mut build = self
            .conda_invocation(repo, package)
            .args(["--no-anaconda-upload", "--quiet"]);
        if skip_existing {
            build = build.arg("--skip-existing");
        }
        run_checked(self.runner.as_ref(), &build).await?;

        let output_query = self.conda_invocation(repo, package).arg("--output");
        let output = run_checked(self.runner.as_ref(), &output_query).await?;

        let path = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                AppError::script_failed(
                    output_query.to_string(),
                    output.code,
                    "conda build did not report an output path",
                )
            })?;
        Ok(repo.join(path))
    }

    fn conda_invocation(&self, repo: &Path, package: &PackageInfo) -> Invocation {
        Invocation::new(&self.tools.conda)
            .args(["build", CONDA_RECIPE_DIR])
            .current_dir(repo)
            .env("VERSION", &package.version)
    }

    async fn generic_build(&self, repo: &Path, package: &PackageInfo) -> AppResult<PathBuf> {
        let build = Invocation::new(&self.tools.python)
            .args(["-m", "build", "--wheel", "--outdir", GENERIC_DIST_DIR])
            .current_dir(repo)
            .env("VERSION", &package.version);
        let output = run_checked(self.runner.as_ref(), &build).await?;

        newest_file(&repo.join(GENERIC_DIST_DIR))
            .await?
            .ok_or_else(|| {
                AppError::script_failed(
                    build.to_string(),
                    output.code,
                    format!("no artifact was written to {}", GENERIC_DIST_DIR),
                )
            })
    }
}

/// Most recently modified regular file in `dir`.
async fn newest_file(dir: &Path) -> AppResult<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified >= *time) {
            newest = Some((modified, entry.path()));
        }
    }
    Ok(newest.map(|(_, path)| path))
}
