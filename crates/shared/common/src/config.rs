//! Tool configuration loaded from environment variables.
//!
//! The resolved [`ToolConfig`] is passed explicitly to every operation.

use std::env;
use std::time::Duration;

use domain::DEFAULT_DB_HOST;

/// Default readiness poll attempts (10 seconds at the default interval)
pub const DEFAULT_READY_ATTEMPTS: u32 = 50;

/// Default sleep between readiness poll attempts
pub const DEFAULT_READY_INTERVAL_MS: u64 = 200;

/// Default superuser role inside the database container
pub const DEFAULT_ADMIN_USER: &str = "postgres";

/// Default maintenance database
pub const DEFAULT_ADMIN_DATABASE: &str = "postgres";

/// External programs the tooling shells out to.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub docker: String,
    pub psql: String,
    pub sqitch: String,
    pub git: String,
    pub conda: String,
    pub anaconda: String,
    pub python: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            psql: "psql".to_string(),
            sqitch: "sqitch".to_string(),
            git: "git".to_string(),
            conda: "conda".to_string(),
            anaconda: "anaconda".to_string(),
            python: "python".to_string(),
        }
    }
}

impl ToolPaths {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            docker: env::var("DOCKER_BIN").unwrap_or(defaults.docker),
            psql: env::var("PSQL_BIN").unwrap_or(defaults.psql),
            sqitch: env::var("SQITCH_BIN").unwrap_or(defaults.sqitch),
            git: env::var("GIT_BIN").unwrap_or(defaults.git),
            conda: env::var("CONDA_BIN").unwrap_or(defaults.conda),
            anaconda: env::var("ANACONDA_BIN").unwrap_or(defaults.anaconda),
            python: env::var("PYTHON_BIN").unwrap_or(defaults.python),
        }
    }
}

/// Bounded retry settings for readiness polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_READY_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_READY_INTERVAL_MS),
        }
    }
}

/// Tool configuration
#[derive(Clone)]
pub struct ToolConfig {
    /// Host the test database is published on
    pub db_host: String,
    /// Role used for provisioning (setup, drop)
    pub admin_user: String,
    admin_password: Option<String>,
    /// Database the admin role connects to
    pub admin_database: String,
    pub readiness: RetryPolicy,
    pub tools: ToolPaths,
    /// Channel packages are uploaded to
    pub package_channel: Option<String>,
    anaconda_token: Option<String>,
}

impl std::fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolConfig")
            .field("db_host", &self.db_host)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"[REDACTED]")
            .field("admin_database", &self.admin_database)
            .field("readiness", &self.readiness)
            .field("tools", &self.tools)
            .field("package_channel", &self.package_channel)
            .field("anaconda_token", &"[REDACTED]")
            .finish()
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            db_host: DEFAULT_DB_HOST.to_string(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_password: None,
            admin_database: DEFAULT_ADMIN_DATABASE.to_string(),
            readiness: RetryPolicy::default(),
            tools: ToolPaths::default(),
            package_channel: None,
            anaconda_token: None,
        }
    }
}

impl ToolConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            db_host: env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string()),
            admin_user: env::var("DB_ADMIN_USER")
                .unwrap_or_else(|_| DEFAULT_ADMIN_USER.to_string()),
            admin_password: env::var("DB_ADMIN_PASSWORD").ok(),
            admin_database: env::var("DB_ADMIN_DATABASE")
                .unwrap_or_else(|_| DEFAULT_ADMIN_DATABASE.to_string()),
            readiness: RetryPolicy {
                attempts: env::var("DB_READY_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_READY_ATTEMPTS),
                interval: Duration::from_millis(
                    env::var("DB_READY_INTERVAL_MS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_READY_INTERVAL_MS),
                ),
            },
            tools: ToolPaths::from_env(),
            package_channel: env::var("PACKAGE_CHANNEL").ok().filter(|c| !c.is_empty()),
            anaconda_token: env::var("ANACONDA_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref()
    }

    pub fn anaconda_token(&self) -> Option<&str> {
        self.anaconda_token.as_deref()
    }

    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    pub fn with_anaconda_token(mut self, token: impl Into<String>) -> Self {
        self.anaconda_token = Some(token.into());
        self
    }
}

/// Environment variable holding the owner password for a project's database.
pub fn db_password_var(project: &str) -> String {
    format!("{}_DB_PASSWORD", project.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ToolConfig::default()
            .with_admin_password("hunter2")
            .with_anaconda_token("tok-123");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("tok-123"));
        assert_eq!(config.anaconda_token(), Some("tok-123"));
    }

    #[test]
    fn test_defaults() {
        let config = ToolConfig::default();
        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.admin_user, "postgres");
        assert_eq!(config.readiness.attempts, 50);
        assert_eq!(config.readiness.interval, Duration::from_millis(200));
    }

    #[test]
    fn test_db_password_var() {
        assert_eq!(db_password_var("data_loader"), "DATA_LOADER_DB_PASSWORD");
    }
}
