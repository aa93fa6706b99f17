//! Deploy command - Package build and upload.

use common::{AppResult, ToolConfig};
use package_deploy_lib::{DeployOptions, PackageManager, PackageService};

use crate::cli::args::DeployArgs;

/// Execute the deploy command
pub async fn execute(args: DeployArgs, config: ToolConfig) -> AppResult<()> {
    let manager = PackageManager::with_system_tools(config);
    run(&manager, args).await
}

async fn run(service: &dyn PackageService, args: DeployArgs) -> AppResult<()> {
    let options = DeployOptions {
        upload: args.upload,
        skip_existing: args.skip_existing,
        package_name: args.package_name,
        all: args.all,
    };

    let artifact = service.deploy(&args.path, options).await?;
    println!("{}", artifact.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use package_deploy_lib::MockPackageService;

    #[tokio::test]
    async fn test_deploy_maps_flags() {
        let mut service = MockPackageService::new();
        service
            .expect_deploy()
            .withf(|repo, options| {
                repo.to_str() == Some(".")
                    && *options
                        == DeployOptions {
                            upload: true,
                            skip_existing: false,
                            package_name: Some("orders_py".to_string()),
                            all: true,
                        }
            })
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("/tmp/orders_py-1.0.0.tar.bz2")));

        let args = DeployArgs {
            upload: true,
            path: PathBuf::from("."),
            skip_existing: false,
            package_name: Some("orders_py".to_string()),
            all: true,
        };
        run(&service, args).await.unwrap();
    }
}
