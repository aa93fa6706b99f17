//! Develop command - Development environment setup.

use common::{AppResult, ToolConfig};
use package_deploy_lib::{PackageManager, PackageService};

use crate::cli::args::DevelopArgs;

/// Execute the develop command
pub async fn execute(args: DevelopArgs, config: ToolConfig) -> AppResult<()> {
    let manager = PackageManager::with_system_tools(config);
    run(&manager, args).await
}

async fn run(service: &dyn PackageService, args: DevelopArgs) -> AppResult<()> {
    let report = service.develop(&args.repo_path, args.env_name).await?;
    tracing::info!(
        env = %report.env_name,
        package = %report.package,
        "Activate with `conda activate {}`",
        report.env_name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use common::AppError;
    use package_deploy_lib::MockPackageService;

    #[tokio::test]
    async fn test_develop_passes_env_name() {
        let mut service = MockPackageService::new();
        service
            .expect_develop()
            .withf(|repo, env| repo.to_str() == Some("/src/orders") && env.as_deref() == Some("scratch"))
            .times(1)
            .returning(|_, _| Err(AppError::DependencyInstallFailed("boom".to_string())));

        let args = DevelopArgs {
            repo_path: PathBuf::from("/src/orders"),
            env_name: Some("scratch".to_string()),
        };
        let err = run(&service, args).await.unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_INSTALL_FAILED");
    }
}
