//! repokit - repository tooling for test databases and packages
//!
//! # CLI Usage
//!
//! ```bash
//! # Start a database with migrations and test data, print its URI
//! repokit db --path ../orders start-local-test-db
//!
//! # Re-seed an existing database
//! repokit db --conn-string postgresql://orders@localhost:6001/orders reset-data
//!
//! # Build and upload the package in the current repository
//! repokit deploy -u
//! ```

pub mod cli;
pub mod commands;
