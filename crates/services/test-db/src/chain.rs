//! Script resolution chains.
//!
//! Each lifecycle phase owns an ordered list of candidates. The first
//! candidate that is available in the calling repository is the one that
//! runs; later candidates are never consulted, even if the chosen one fails.

use std::path::{Path, PathBuf};

use domain::{
    Phase, INSERT_TEST_DATA_SCRIPT_PATH, INSERT_TEST_DATA_SQL_PATH, MIGRATE_SCRIPT_PATH,
    RESET_DATA_SCRIPT_PATH, RESET_DATA_SQL_PATH, SETUP_SQL_PATH, SQITCH_DIR_PATH,
};

/// Role a SQL file is executed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlRole {
    /// Superuser against the maintenance database
    Admin,
    /// The descriptor's user against the descriptor's database
    Owner,
}

/// One way of carrying out a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Repository executable, called with the connection URI
    Executable(PathBuf),
    /// Repository SQL file piped to psql
    SqlFile { path: PathBuf, role: SqlRole },
    /// Repository sqitch project deployed against the descriptor
    SqitchPlan(PathBuf),
    /// Built-in setup script
    TemplateSetup,
    /// Drop the database, then set it up and migrate it again
    DropAndRecreate,
}

impl Candidate {
    /// Whether this candidate can run for the current repository
    pub fn is_available(&self) -> bool {
        match self {
            Candidate::Executable(path) | Candidate::SqlFile { path, .. } => path.is_file(),
            Candidate::SqitchPlan(dir) => dir.is_dir(),
            Candidate::TemplateSetup | Candidate::DropAndRecreate => true,
        }
    }

    /// Short label for logs
    pub fn describe(&self) -> String {
        match self {
            Candidate::Executable(path) => format!("executable '{}'", path.display()),
            Candidate::SqlFile { path, role } => {
                format!("SQL file '{}' as {:?}", path.display(), role)
            }
            Candidate::SqitchPlan(dir) => format!("sqitch plan in '{}'", dir.display()),
            Candidate::TemplateSetup => "built-in setup template".to_string(),
            Candidate::DropAndRecreate => "drop and recreate".to_string(),
        }
    }
}

/// Whether `path` carries an execute permission bit.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Ordered candidates for a single phase.
#[derive(Debug, Clone)]
pub struct ResolutionChain {
    phase: Phase,
    candidates: Vec<Candidate>,
}

impl ResolutionChain {
    pub fn new(phase: Phase, candidates: Vec<Candidate>) -> Self {
        Self { phase, candidates }
    }

    /// Chain for `phase` rooted at the calling repository.
    ///
    /// Returns `None` for phases that do not resolve scripts.
    pub fn for_phase(phase: Phase, repo: &Path) -> Option<Self> {
        let candidates = match phase {
            Phase::Setup => vec![
                Candidate::SqlFile {
                    path: repo.join(SETUP_SQL_PATH),
                    role: SqlRole::Admin,
                },
                Candidate::TemplateSetup,
            ],
            Phase::Migrate => vec![
                Candidate::Executable(repo.join(MIGRATE_SCRIPT_PATH)),
                Candidate::SqitchPlan(repo.join(SQITCH_DIR_PATH)),
            ],
            Phase::InsertTestData => vec![
                Candidate::Executable(repo.join(INSERT_TEST_DATA_SCRIPT_PATH)),
                Candidate::SqlFile {
                    path: repo.join(INSERT_TEST_DATA_SQL_PATH),
                    role: SqlRole::Owner,
                },
            ],
            Phase::ResetData => vec![
                Candidate::Executable(repo.join(RESET_DATA_SCRIPT_PATH)),
                Candidate::SqlFile {
                    path: repo.join(RESET_DATA_SQL_PATH),
                    role: SqlRole::Owner,
                },
                Candidate::DropAndRecreate,
            ],
            Phase::Start | Phase::Stop => return None,
        };
        Some(Self::new(phase, candidates))
    }

    /// First available candidate, evaluated lazily in priority order.
    pub fn resolve(&self) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| {
            let available = candidate.is_available();
            if !available {
                tracing::debug!(
                    phase = %self.phase,
                    candidate = %candidate.describe(),
                    "Candidate not present, trying the next one"
                );
            }
            available
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(repo: &Path, relative: &str) {
        let path = repo.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "-- test\n").unwrap();
    }

    fn resolved(phase: Phase, repo: &Path) -> Option<Candidate> {
        ResolutionChain::for_phase(phase, repo)
            .unwrap()
            .resolve()
            .cloned()
    }

    #[test]
    fn test_setup_prefers_repo_script() {
        let repo = tempfile::tempdir().unwrap();
        assert_eq!(resolved(Phase::Setup, repo.path()), Some(Candidate::TemplateSetup));

        touch(repo.path(), SETUP_SQL_PATH);
        assert_eq!(
            resolved(Phase::Setup, repo.path()),
            Some(Candidate::SqlFile {
                path: repo.path().join(SETUP_SQL_PATH),
                role: SqlRole::Admin,
            })
        );
    }

    #[test]
    fn test_migrate_order() {
        let repo = tempfile::tempdir().unwrap();
        assert_eq!(resolved(Phase::Migrate, repo.path()), None);

        fs::create_dir_all(repo.path().join(SQITCH_DIR_PATH)).unwrap();
        assert_eq!(
            resolved(Phase::Migrate, repo.path()),
            Some(Candidate::SqitchPlan(repo.path().join(SQITCH_DIR_PATH)))
        );

        touch(repo.path(), MIGRATE_SCRIPT_PATH);
        assert_eq!(
            resolved(Phase::Migrate, repo.path()),
            Some(Candidate::Executable(repo.path().join(MIGRATE_SCRIPT_PATH)))
        );
    }

    #[test]
    fn test_insert_test_data_order() {
        let repo = tempfile::tempdir().unwrap();
        assert_eq!(resolved(Phase::InsertTestData, repo.path()), None);

        touch(repo.path(), INSERT_TEST_DATA_SQL_PATH);
        assert!(matches!(
            resolved(Phase::InsertTestData, repo.path()),
            Some(Candidate::SqlFile { role: SqlRole::Owner, .. })
        ));

        touch(repo.path(), INSERT_TEST_DATA_SCRIPT_PATH);
        assert!(matches!(
            resolved(Phase::InsertTestData, repo.path()),
            Some(Candidate::Executable(_))
        ));
    }

    #[test]
    fn test_reset_data_order() {
        let repo = tempfile::tempdir().unwrap();
        assert_eq!(
            resolved(Phase::ResetData, repo.path()),
            Some(Candidate::DropAndRecreate)
        );

        touch(repo.path(), RESET_DATA_SQL_PATH);
        assert!(matches!(
            resolved(Phase::ResetData, repo.path()),
            Some(Candidate::SqlFile { .. })
        ));

        touch(repo.path(), RESET_DATA_SCRIPT_PATH);
        assert!(matches!(
            resolved(Phase::ResetData, repo.path()),
            Some(Candidate::Executable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_bit_detection() {
        use std::os::unix::fs::PermissionsExt;

        let repo = tempfile::tempdir().unwrap();
        let script = repo.path().join("migrate");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!is_executable(&script));

        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(is_executable(&script));
        assert!(!is_executable(&repo.path().join("missing")));
    }

    #[test]
    fn test_directory_is_not_a_script() {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir_all(repo.path().join(MIGRATE_SCRIPT_PATH)).unwrap();

        assert_eq!(resolved(Phase::Migrate, repo.path()), None);
    }

    #[test]
    fn test_start_and_stop_have_no_chain() {
        let repo = tempfile::tempdir().unwrap();
        assert!(ResolutionChain::for_phase(Phase::Start, repo.path()).is_none());
        assert!(ResolutionChain::for_phase(Phase::Stop, repo.path()).is_none());
    }
}
