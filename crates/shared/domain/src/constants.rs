//! Domain-level constants.
//!
//! These constants describe the conventions a calling repository follows
//! to override default behavior.

// =============================================================================
// PostgreSQL
// =============================================================================

/// Port PostgreSQL listens on inside the container
pub const DEFAULT_PG_PORT: u16 = 5432;

/// Default host for test databases
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Accepted connection string schemes
pub const CONNECTION_SCHEMES: &[&str] = &["postgresql://", "postgres://"];

// =============================================================================
// Calling repository layout
// =============================================================================

/// Image definition for the database container
pub const DOCKERFILE_PATH: &str = "database/Dockerfile";

/// Setup script, run before any migration
pub const SETUP_SQL_PATH: &str = "database/setup.sql";

/// Migration executable
pub const MIGRATE_SCRIPT_PATH: &str = "database/migrate";

/// Sqitch project directory
pub const SQITCH_DIR_PATH: &str = "database/sqitch";

pub const INSERT_TEST_DATA_SCRIPT_PATH: &str = "database/insert_test_data";
pub const INSERT_TEST_DATA_SQL_PATH: &str = "database/insert_test_data.sql";

pub const RESET_DATA_SCRIPT_PATH: &str = "database/reset_data";
pub const RESET_DATA_SQL_PATH: &str = "database/reset_data.sql";

// =============================================================================
// Packaging
// =============================================================================

/// Plain-text version marker at the repository root
pub const VERSION_FILE: &str = "VERSION";

/// Package recipe directory
pub const CONDA_RECIPE_DIR: &str = "conda-build";

/// Package recipe file
pub const CONDA_META_PATH: &str = "conda-build/meta.yaml";

/// Source files searched for a `__version__` assignment, relative to the package directory
pub const VERSION_SOURCE_FILES: &[&str] = &["__init__.py", "_version.py"];

/// Output directory of the generic build
pub const GENERIC_DIST_DIR: &str = "dist";
