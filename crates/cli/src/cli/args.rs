//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// repokit - Test database lifecycle and package tooling
#[derive(Parser, Debug)]
#[command(name = "repokit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage a repository's test database
    Db(DbArgs),

    /// Create a conda environment with the repository's dependencies
    Develop(DevelopArgs),

    /// Build the repository's package and optionally upload it
    Deploy(DeployArgs),
}

/// Arguments for the db command
#[derive(Parser, Debug)]
pub struct DbArgs {
    /// Repository whose database scripts are used
    #[arg(long, default_value = ".", global = true)]
    pub path: PathBuf,

    /// Connection string of the database (defaults are derived from the repository)
    #[arg(long, global = true)]
    pub conn_string: Option<String>,

    /// Image name to build (defaults to the database name)
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// Host port (start picks a free port when omitted)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub action: DbAction,
}

/// Database lifecycle actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbAction {
    /// Start a database and run setup
    Start,
    /// Start a database, run setup, migrations and insert test data
    StartLocalTestDb,
    /// Kill and remove the database container
    Stop,
    /// Create the owner role and database
    SetupDb,
    /// Run migrations
    Migrate,
    /// Insert test data
    InsertTestData,
    /// Reset data to the post-migration state
    ResetData,
}

impl DbAction {
    /// Whether the action launches a new container
    pub fn starts_container(&self) -> bool {
        matches!(self, DbAction::Start | DbAction::StartLocalTestDb)
    }
}

/// Arguments for the develop command
#[derive(Parser, Debug)]
pub struct DevelopArgs {
    /// Repository to set up
    pub repo_path: PathBuf,

    /// Environment name (defaults to the checked-out ref)
    #[arg(long)]
    pub env_name: Option<String>,
}

/// Arguments for the deploy command
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Upload the built package
    #[arg(short, long)]
    pub upload: bool,

    /// Repository to build
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Skip the build if the package already exists locally
    #[arg(long = "skip")]
    pub skip_existing: bool,

    /// Package name to upload under
    #[arg(short = 'r', long)]
    pub package_name: Option<String>,

    /// Upload for all platforms
    #[arg(short, long)]
    pub all: bool,
}
