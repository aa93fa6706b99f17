//! Domain layer - Core value types shared by the tooling crates.
//!
//! This crate contains pure logic with no process or filesystem access.

pub mod connection;
pub mod constants;
pub mod error;
pub mod package;
pub mod phase;

pub use connection::ConnectionDescriptor;
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use package::{normalize_package_name, parse_version_assignment, parse_version_file, PackageInfo};
pub use phase::Phase;
