//! Package Build and Deploy Library
//!
//! Infers a repository's package name and version, builds it with conda
//! (or a generic wheel build when the repository has no recipe), prepares
//! development environments and uploads built artifacts.

pub mod build;
pub mod inference;
pub mod service;

pub use build::{BuildKind, Builder};
pub use inference::{infer_name, infer_package, infer_version};
pub use service::{DeployOptions, DevelopReport, PackageManager, PackageService};

#[cfg(any(test, feature = "test-utils"))]
pub use service::MockPackageService;
