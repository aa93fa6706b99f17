//! `psql` wrapper for running SQL scripts.

use std::sync::Arc;

use common::{run_checked, AppResult, CommandRunner, Invocation};
use domain::ConnectionDescriptor;

/// Pipes SQL scripts to `psql`.
#[derive(Clone)]
pub struct SqlClient {
    runner: Arc<dyn CommandRunner>,
    psql: String,
}

impl SqlClient {
    pub fn new(runner: Arc<dyn CommandRunner>, psql: impl Into<String>) -> Self {
        Self {
            runner,
            psql: psql.into(),
        }
    }

    /// Invocation running `script` against `target`.
    ///
    /// `ON_ERROR_STOP` makes any failing statement produce a non-zero exit.
    pub fn invocation(&self, target: &ConnectionDescriptor, script: impl Into<Vec<u8>>) -> Invocation {
        let invocation = Invocation::new(&self.psql)
            .args(["-X", "-q", "-v", "ON_ERROR_STOP=1"])
            .args(["-h", target.host()])
            .args(["-p".to_string(), target.port().to_string()])
            .args(["-U", target.user()])
            .args(["-d", target.database()])
            .stdin(script);

        match target.password() {
            Some(password) => invocation.env("PGPASSWORD", password),
            None => invocation,
        }
    }

    pub async fn run_script(
        &self,
        target: &ConnectionDescriptor,
        script: impl Into<Vec<u8>>,
    ) -> AppResult<()> {
        let invocation = self.invocation(target, script);
        run_checked(self.runner.as_ref(), &invocation).await.map(|_| ())
    }
}
