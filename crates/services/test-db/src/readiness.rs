//! Bounded readiness polling.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use common::{AppError, AppResult, RetryPolicy};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Per-attempt connection timeout for the client probe
const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `check` until it reports ready, at most `policy.attempts` times.
///
/// Sleeps `policy.interval` between attempts (not after the last one) and
/// returns the attempt number that succeeded.
pub async fn poll_until_ready<F, Fut>(
    service: &str,
    policy: RetryPolicy,
    mut check: F,
) -> AppResult<u32>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.attempts {
        if check(attempt).await {
            tracing::debug!(service, attempt, "Service is ready");
            return Ok(attempt);
        }

        tracing::debug!(service, attempt, max_attempts = policy.attempts, "Service is not ready yet");
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(AppError::not_ready(service, policy.attempts))
}

/// Checks whether a database accepts client connections.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn is_ready(&self, url: &str) -> bool;
}

/// [`ConnectionProbe`] that opens a sea-orm connection and runs `SELECT 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmProbe;

#[async_trait]
impl ConnectionProbe for SeaOrmProbe {
    async fn is_ready(&self, url: &str) -> bool {
        let mut options = ConnectOptions::new(url.to_string());
        options
            .max_connections(1)
            .connect_timeout(PROBE_CONNECT_TIMEOUT)
            .sqlx_logging(false);

        let connection = match Database::connect(options).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::debug!(error = %e, "Database not accepting connections yet");
                return false;
            }
        };

        let ping = connection
            .execute(Statement::from_string(
                connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await;

        if let Err(e) = connection.close().await {
            tracing::debug!(error = %e, "Failed to close probe connection");
        }

        match ping {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Database connection opened but query failed");
                false
            }
        }
    }
}
