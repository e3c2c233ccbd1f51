use crate::error::{DepwizError, Result};
use std::path::{Path, PathBuf};

const FORBIDDEN: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// Path checks applied before scanning or writing package manifests.
pub struct PathValidator;

impl PathValidator {
    /// Canonicalises a project path and refuses system directories.
    pub fn validate_project_path(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            DepwizError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(DepwizError::ProjectValidation(format!(
                "Path '{}' is not a directory",
                canonical.display()
            )));
        }

        for forbidden in FORBIDDEN {
            let forbidden_path = Path::new(forbidden);
            let canonical_forbidden = forbidden_path
                .canonicalize()
                .unwrap_or_else(|_| forbidden_path.to_path_buf());

            if canonical.starts_with(forbidden_path) || canonical.starts_with(&canonical_forbidden)
            {
                return Err(DepwizError::ProjectValidation(format!(
                    "Access to system directory '{}' is not allowed",
                    forbidden
                )));
            }
        }

        Ok(canonical)
    }

    /// Ensures a package directory lies inside the workspace root.
    pub fn ensure_within(package_dir: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<PathBuf> {
        let package_dir = package_dir.as_ref();
        let root = root.as_ref();

        let canonical_package = package_dir.canonicalize().map_err(|e| {
            DepwizError::ProjectValidation(format!(
                "Invalid package path '{}': {e}",
                package_dir.display()
            ))
        })?;
        let canonical_root = root.canonicalize().map_err(|e| {
            DepwizError::ProjectValidation(format!("Invalid root '{}': {e}", root.display()))
        })?;

        if !canonical_package.starts_with(&canonical_root) {
            return Err(DepwizError::ProjectValidation(format!(
                "Package '{}' is outside the workspace",
                package_dir.display()
            )));
        }

        Ok(canonical_package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn accepts_directory() {
        let dir = tempdir().unwrap();
        assert!(PathValidator::validate_project_path(dir.path()).is_ok());
    }

    #[test]
    fn rejects_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("package.json");
        fs::write(&file_path, "{}").unwrap();
        let err = PathValidator::validate_project_path(&file_path).unwrap_err();
        assert!(matches!(err, DepwizError::ProjectValidation(_)));
    }

    #[test]
    fn rejects_system_directory() {
        assert!(PathValidator::validate_project_path("/etc").is_err());
    }

    #[test]
    fn package_inside_root_is_accepted() {
        let dir = tempdir().unwrap();
        let member = dir.path().join("packages/a");
        fs::create_dir_all(&member).unwrap();
        assert!(PathValidator::ensure_within(&member, dir.path()).is_ok());
    }

    #[test]
    fn package_outside_root_is_rejected() {
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();
        assert!(PathValidator::ensure_within(other.path(), root.path()).is_err());
    }
}
