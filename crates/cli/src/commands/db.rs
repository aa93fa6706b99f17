//! Db command - Test database lifecycle.

use std::sync::Arc;

use common::{db_password_var, git, AppResult, CommandRunner, SystemRunner, ToolConfig};
use domain::{ConnectionDescriptor, DEFAULT_PG_PORT};
use test_db_lib::{find_free_port, Orchestrator, SeaOrmProbe};

use crate::cli::args::{DbAction, DbArgs};

/// Execute the db command
pub async fn execute(args: DbArgs, config: ToolConfig) -> AppResult<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let descriptor = resolve_descriptor(&args, &config, runner.as_ref()).await?;
    tracing::debug!(?descriptor, action = ?args.action, "Resolved database");

    let mut orchestrator = Orchestrator::new(&args.path, config, runner, Arc::new(SeaOrmProbe));
    if let Some(image) = args.image {
        orchestrator = orchestrator.with_image_name(image);
    }

    match args.action {
        DbAction::Start => {
            let uri = orchestrator.start(&descriptor, false).await?;
            println!("{}", uri);
        }
        DbAction::StartLocalTestDb => {
            let uri = orchestrator.start(&descriptor, true).await?;
            println!("{}", uri);
        }
        DbAction::Stop => orchestrator.stop(&descriptor).await?,
        DbAction::SetupDb => orchestrator.setup(&descriptor).await?,
        DbAction::Migrate => orchestrator.migrate(&descriptor).await?,
        DbAction::InsertTestData => orchestrator.insert_test_data(&descriptor).await?,
        DbAction::ResetData => orchestrator.reset_data(&descriptor).await?,
    }

    Ok(())
}

/// Connection descriptor for this invocation.
///
/// An explicit connection string wins. Otherwise user and database are the
/// project name, the password comes from `<PROJECT>_DB_PASSWORD`, and the
/// port is `--port`, a free port when starting, or 5432.
pub async fn resolve_descriptor(
    args: &DbArgs,
    config: &ToolConfig,
    runner: &dyn CommandRunner,
) -> AppResult<ConnectionDescriptor> {
    if let Some(conn_string) = &args.conn_string {
        return Ok(conn_string.parse()?);
    }

    let project = git::repo_name(runner, &config.tools.git, &args.path).await?;
    let password = std::env::var(db_password_var(&project))
        .ok()
        .filter(|p| !p.is_empty());
    let port = match args.port {
        Some(port) => port,
        None if args.action.starts_container() => find_free_port()?,
        None => DEFAULT_PG_PORT,
    };

    Ok(ConnectionDescriptor::new(
        project.as_str(),
        password,
        config.db_host.as_str(),
        port,
        project.as_str(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use common::{CommandOutput, MockCommandRunner};

    fn args(action: DbAction) -> DbArgs {
        DbArgs {
            path: PathBuf::from("."),
            conn_string: None,
            image: None,
            port: None,
            action,
        }
    }

    #[tokio::test]
    async fn test_conn_string_wins() {
        let runner = MockCommandRunner::new();
        let mut args = args(DbAction::Migrate);
        args.conn_string = Some("postgres://orders:pw@db.internal:6001/orders".to_string());

        let descriptor = resolve_descriptor(&args, &ToolConfig::default(), &runner)
            .await
            .unwrap();

        assert_eq!(descriptor.host(), "db.internal");
        assert_eq!(descriptor.port(), 6001);
        assert_eq!(descriptor.password(), Some("pw"));
    }

    #[tokio::test]
    async fn test_defaults_from_project_name() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutput::success_with("https://github.com/acme/ledger-svc-xyzzy.git\n")));

        let descriptor = resolve_descriptor(&args(DbAction::SetupDb), &ToolConfig::default(), &runner)
            .await
            .unwrap();

        assert_eq!(descriptor.user(), "ledger_svc_xyzzy");
        assert_eq!(descriptor.database(), "ledger_svc_xyzzy");
        assert_eq!(descriptor.host(), "localhost");
        assert_eq!(descriptor.port(), 5432);
    }

    #[tokio::test]
    async fn test_start_picks_a_port() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutput::success_with("git@github.com:acme/orders.git\n")));

        let descriptor = resolve_descriptor(&args(DbAction::Start), &ToolConfig::default(), &runner)
            .await
            .unwrap();

        assert_ne!(descriptor.port(), 0);
        assert_eq!(descriptor.container_name(), format!("orders_{}", descriptor.port()));
    }

    #[tokio::test]
    async fn test_invalid_conn_string() {
        let mut args = args(DbAction::Stop);
        args.conn_string = Some("mysql://root@localhost/app".to_string());

        let err = resolve_descriptor(&args, &ToolConfig::default(), &MockCommandRunner::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
