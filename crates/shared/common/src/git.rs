//! Git lookups used to name projects and environments.

use std::path::Path;

use domain::{normalize_package_name, DomainError};

use crate::error::AppResult;
use crate::process::{run_checked, CommandRunner, Invocation};

/// Project name of the repository at `repo`.
///
/// Uses the `origin` remote's basename, falling back to the name of the
/// working tree's top-level directory.
pub async fn repo_name(runner: &dyn CommandRunner, git: &str, repo: &Path) -> AppResult<String> {
    let remote = Invocation::new(git)
        .args(["config", "--get", "remote.origin.url"])
        .current_dir(repo);
    let output = runner.run(&remote).await?;

    let raw = if output.success() && !output.stdout.trim().is_empty() {
        output.stdout
    } else {
        tracing::debug!(repo = %repo.display(), "No origin remote, using the top-level directory name");
        let toplevel = Invocation::new(git)
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(repo);
        run_checked(runner, &toplevel).await?.stdout
    };

    let name = normalize_package_name(&raw);
    if name.is_empty() {
        return Err(DomainError::validation(format!(
            "could not infer a project name for '{}'",
            repo.display()
        ))
        .into());
    }
    Ok(name)
}

/// Environment name for the checked-out ref, e.g. `heads__main`.
pub async fn describe_head(runner: &dyn CommandRunner, git: &str, repo: &Path) -> AppResult<String> {
    let describe = Invocation::new(git)
        .args(["describe", "--all", "HEAD"])
        .current_dir(repo);
    let output = run_checked(runner, &describe).await?;
    Ok(output.stdout.trim().replace('/', "__"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockCommandRunner};

    #[tokio::test]
    async fn test_repo_name_from_remote() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.has_arg("remote.origin.url"))
            .times(1)
            .returning(|_| Ok(CommandOutput::success_with("git@github.com:acme/Data-Loader.git\n")));

        let name = repo_name(&runner, "git", Path::new("/tmp/x")).await.unwrap();
        assert_eq!(name, "data_loader");
    }

    #[tokio::test]
    async fn test_repo_name_falls_back_to_toplevel() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.has_arg("remote.origin.url"))
            .times(1)
            .returning(|_| Ok(CommandOutput::failure(1, "")));
        runner
            .expect_run()
            .withf(|inv| inv.has_arg("--show-toplevel"))
            .times(1)
            .returning(|_| Ok(CommandOutput::success_with("/home/dev/my-service\n")));

        let name = repo_name(&runner, "git", Path::new("/home/dev/my-service"))
            .await
            .unwrap();
        assert_eq!(name, "my_service");
    }

    #[tokio::test]
    async fn test_describe_head() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutput::success_with("heads/feature/x\n")));

        let env = describe_head(&runner, "git", Path::new(".")).await.unwrap();
        assert_eq!(env, "heads__feature__x");
    }
}
