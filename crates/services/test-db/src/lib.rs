//! Test Database Library
//!
//! Stands up disposable PostgreSQL databases in containers and runs the
//! calling repository's setup, migration, test data and reset scripts,
//! falling back to built-in defaults where the repository has none.
//!
//! # Lifecycle
//!
//! ```text
//! start ─▶ setup ─▶ migrate ─▶ insert-test-data
//!                      ▲
//! reset-data ──────────┘ (drop, setup, migrate when no override exists)
//! stop
//! ```

pub mod chain;
pub mod container;
pub mod orchestrator;
pub mod readiness;
pub mod sql;
pub mod template;

pub use chain::{Candidate, ResolutionChain, SqlRole};
pub use container::{find_free_port, ContainerEngine, ImageSource};
pub use orchestrator::Orchestrator;
pub use readiness::{poll_until_ready, ConnectionProbe, SeaOrmProbe};
pub use sql::SqlClient;

#[cfg(any(test, feature = "test-utils"))]
pub use readiness::MockConnectionProbe;
