//! Database lifecycle phases.

use std::fmt;

/// One step of the test database lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Setup,
    Migrate,
    InsertTestData,
    ResetData,
    Stop,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Setup => "setup",
            Phase::Migrate => "migrate",
            Phase::InsertTestData => "insert-test-data",
            Phase::ResetData => "reset-data",
            Phase::Stop => "stop",
        }
    }

    /// Whether finding nothing to run is acceptable for this phase
    pub fn is_optional(&self) -> bool {
        matches!(self, Phase::Setup)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
