//! Source root confinement
//!
//! When a server root is configured, every path a tool receives must
//! resolve (after following symlinks and `..`) to a file under it.

use crate::errors::{AnalyzerError, Result};
use std::path::{Path, PathBuf};

/// Path jail security manager
#[derive(Debug, Clone)]
pub struct PathJail {
    /// Canonicalized jail root directory
    jail_root: PathBuf,
}

impl PathJail {
    /// Create new path jail with given root directory
    pub fn new(jail_root: impl AsRef<Path>) -> Result<Self> {
        let jail_root = jail_root.as_ref();

        if !jail_root.is_dir() {
            return Err(AnalyzerError::ConfigError(format!(
                "Source root is not a directory: {}",
                jail_root.display()
            )));
        }

        let jail_root = jail_root.canonicalize().map_err(|e| {
            AnalyzerError::ConfigError(format!("Failed to canonicalize source root: {}", e))
        })?;

        Ok(Self { jail_root })
    }

    /// Verify path is within jail and return canonical path
    ///
    /// Relative paths are taken relative to the root. Missing files report
    /// `FileNotFound` only when the requested path itself stays lexically
    /// inside the root; anything else is `PathEscapesRoot`.
    pub fn verify_and_canonicalize(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.jail_root.join(path)
        };

        let canonical = match full_path.canonicalize() {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return if lexically_within(&full_path, &self.jail_root) {
                    Err(AnalyzerError::FileNotFound(path.to_path_buf()))
                } else {
                    Err(AnalyzerError::PathEscapesRoot(path.to_path_buf()))
                };
            }
            Err(e) => return Err(AnalyzerError::IoError(e)),
        };

        if !canonical.starts_with(&self.jail_root) {
            return Err(AnalyzerError::PathEscapesRoot(path.to_path_buf()));
        }

        Ok(canonical)
    }

    /// Get jail root directory
    pub fn jail_root(&self) -> &Path {
        &self.jail_root
    }
}

/// Resolve `.` and `..` without touching the filesystem and test containment
fn lexically_within(path: &Path, root: &Path) -> bool {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return false;
                }
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup_test_jail() -> (PathJail, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let jail = PathJail::new(temp_dir.path()).unwrap();
        (jail, temp_dir)
    }

    #[test]
    fn test_jail_creation_nonexistent() {
        let err = PathJail::new("/nonexistent/path/12345").unwrap_err();
        assert!(matches!(err, AnalyzerError::ConfigError(_)));
    }

    #[test]
    fn test_verify_path_within_jail() {
        let (jail, temp_dir) = setup_test_jail();
        fs::write(temp_dir.path().join("main.c"), "int x;\n").unwrap();

        let relative = jail.verify_and_canonicalize("main.c").unwrap();
        assert!(relative.starts_with(jail.jail_root()));

        let absolute = jail
            .verify_and_canonicalize(temp_dir.path().join("main.c"))
            .unwrap();
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_nested_directories() {
        let (jail, temp_dir) = setup_test_jail();
        let nested = temp_dir.path().join("src/util");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("str.c"), "").unwrap();

        assert!(jail.verify_and_canonicalize("src/util/str.c").is_ok());
        assert!(jail.verify_and_canonicalize("src/util/../util/str.c").is_ok());
    }

    #[test]
    fn test_missing_file_inside_root() {
        let (jail, _temp_dir) = setup_test_jail();
        let err = jail.verify_and_canonicalize("missing.c").unwrap_err();
        assert!(matches!(err, AnalyzerError::FileNotFound(_)));
    }

    #[test]
    fn test_escape_attempts_rejected() {
        let (jail, _temp_dir) = setup_test_jail();

        for attempt in ["../../../etc/passwd", "../../..", "/etc/passwd", "sub/../../x.c"] {
            let result = jail.verify_and_canonicalize(attempt);
            assert!(result.is_err(), "Escape attempt should fail: {}", attempt);
        }
        assert!(matches!(
            jail.verify_and_canonicalize("/etc/passwd"),
            Err(AnalyzerError::PathEscapesRoot(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_rejected() {
        let (jail, temp_dir) = setup_test_jail();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.c"), "int s;\n").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.c"), temp_dir.path().join("link.c"))
            .unwrap();

        assert!(matches!(
            jail.verify_and_canonicalize("link.c"),
            Err(AnalyzerError::PathEscapesRoot(_))
        ));
    }
}
