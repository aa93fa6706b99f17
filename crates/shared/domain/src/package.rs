//! Package identity and version marker parsing.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DomainError, DomainResult};

static VERSION_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^__version__\s*=\s*['"]([^'"]*)['"]"#).expect("version pattern is valid")
});

/// Name and version inferred for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let version = version.into();
        if name.is_empty() {
            return Err(DomainError::validation("package name must not be empty"));
        }
        if version.is_empty() {
            return Err(DomainError::validation("package version must not be empty"));
        }
        Ok(Self { name, version })
    }
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// Extract the value of a `__version__ = "x.y.z"` assignment.
pub fn parse_version_assignment(source: &str) -> Option<String> {
    VERSION_ASSIGNMENT
        .captures(source)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|version| !version.is_empty())
}

/// Read a `VERSION` file's contents.
///
/// Accepts either a bare version string or a `__version__` assignment.
pub fn parse_version_file(contents: &str) -> Option<String> {
    if let Some(version) = parse_version_assignment(contents) {
        return Some(version);
    }
    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Normalise a repository name into a package/database identifier.
///
/// Strips a trailing `.git`, lowercases, and replaces `-` with `_`.
pub fn normalize_package_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let base = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    base.trim_end_matches(".git").to_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_assignment_double_quotes() {
        let source = "\"\"\"Docs\"\"\"\n__version__ = \"4.5.6\"\n";
        assert_eq!(parse_version_assignment(source), Some("4.5.6".to_string()));
    }

    #[test]
    fn test_version_assignment_single_quotes() {
        assert_eq!(
            parse_version_assignment("__version__='0.1.0'"),
            Some("0.1.0".to_string())
        );
    }

    #[test]
    fn test_version_assignment_must_start_line() {
        assert_eq!(parse_version_assignment("x = __version__ = '1.0'"), None);
    }

    #[test]
    fn test_version_file_bare() {
        assert_eq!(parse_version_file("1.2.3\n"), Some("1.2.3".to_string()));
    }

    #[test]
    fn test_version_file_assignment() {
        assert_eq!(
            parse_version_file("__version__ = \"2.0.0\"\n"),
            Some("2.0.0".to_string())
        );
    }

    #[test]
    fn test_version_file_empty() {
        assert_eq!(parse_version_file("\n  \n"), None);
    }

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(
            normalize_package_name("git@github.com:acme/My-Tool.git"),
            "my_tool"
        );
        assert_eq!(
            normalize_package_name("https://github.com/acme/data-loader.git\n"),
            "data_loader"
        );
        assert_eq!(normalize_package_name("/home/dev/some-repo"), "some_repo");
    }
}
