//! Package name and version inference.

use std::io::ErrorKind;
use std::path::Path;

use common::{git, AppError, AppResult, CommandRunner, ToolConfig};
use domain::{
    normalize_package_name, parse_version_assignment, parse_version_file, PackageInfo,
    VERSION_FILE, VERSION_SOURCE_FILES,
};

/// Package name for the repository at `repo`.
///
/// An explicit `name_override` wins over the git remote.
pub async fn infer_name(
    runner: &dyn CommandRunner,
    config: &ToolConfig,
    repo: &Path,
    name_override: Option<&str>,
) -> AppResult<String> {
    match name_override {
        Some(name) => Ok(normalize_package_name(name)),
        None => git::repo_name(runner, &config.tools.git, repo).await,
    }
}

/// Version of package `name` in `repo`.
///
/// Checks the `VERSION` file first, then `<name>/__init__.py` and
/// `<name>/_version.py`.
pub async fn infer_version(repo: &Path, name: &str) -> AppResult<String> {
    let version_file = repo.join(VERSION_FILE);
    if let Some(contents) = read_if_exists(&version_file).await? {
        if let Some(version) = parse_version_file(&contents) {
            tracing::debug!(file = %version_file.display(), version = %version, "Version from file");
            return Ok(version);
        }
    }

    for source in VERSION_SOURCE_FILES {
        let path = repo.join(name).join(source);
        let Some(contents) = read_if_exists(&path).await? else {
            continue;
        };
        if let Some(version) = parse_version_assignment(&contents) {
            tracing::debug!(file = %path.display(), version = %version, "Version from source");
            return Ok(version);
        }
    }

    Err(AppError::MissingVersion {
        path: repo.to_path_buf(),
    })
}

/// Name and version of the repository at `repo`.
pub async fn infer_package(
    runner: &dyn CommandRunner,
    config: &ToolConfig,
    repo: &Path,
    name_override: Option<&str>,
) -> AppResult<PackageInfo> {
    let name = infer_name(runner, config, repo, name_override).await?;
    let version = infer_version(repo, &name).await?;
    Ok(PackageInfo::new(name, version)?)
}

async fn read_if_exists(path: &Path) -> AppResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use common::MockCommandRunner;

    #[tokio::test]
    async fn test_name_override_skips_git() {
        let runner = MockCommandRunner::new();
        let name = infer_name(
            &runner,
            &ToolConfig::default(),
            Path::new("."),
            Some("Data-Loader"),
        )
        .await
        .unwrap();
        assert_eq!(name, "data_loader");
    }

    #[tokio::test]
    async fn test_version_file_wins_over_source() {
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("VERSION"), "2.0.0\n").unwrap();
        fs::create_dir(repo.path().join("pkg")).unwrap();
        fs::write(repo.path().join("pkg/__init__.py"), "__version__ = '1.0.0'\n").unwrap();

        assert_eq!(infer_version(repo.path(), "pkg").await.unwrap(), "2.0.0");
    }

    #[tokio::test]
    async fn test_unreadable_marker_is_an_error() {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir(repo.path().join("VERSION")).unwrap();

        let err = infer_version(repo.path(), "pkg").await.unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[tokio::test]
    async fn test_version_module_fallback() {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir(repo.path().join("pkg")).unwrap();
        fs::write(repo.path().join("pkg/__init__.py"), "from ._version import *\n").unwrap();
        fs::write(repo.path().join("pkg/_version.py"), "__version__ = \"0.9.1\"\n").unwrap();

        assert_eq!(infer_version(repo.path(), "pkg").await.unwrap(), "0.9.1");
    }
}
