use crate::error::LookupError;
use crate::workspace::{InstalledPackage, InstalledTable, TreeLookup};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Reads installed versions from a package's `node_modules` directory.
///
/// Only the first level is inspected; nested `node_modules` belong to
/// transitive dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeModulesTree;

#[derive(Deserialize)]
struct InstalledManifest {
    name: Option<String>,
    version: Option<String>,
}

impl NodeModulesTree {
    pub fn new() -> Self {
        Self
    }

    fn read_entry(dir: &Path) -> Option<(String, InstalledPackage)> {
        let content = fs::read_to_string(dir.join("package.json")).ok()?;
        let manifest: InstalledManifest = serde_json::from_str(&content).ok()?;
        let name = manifest.name?;
        let version = manifest.version?;
        Some((name, InstalledPackage { version }))
    }
}

impl TreeLookup for NodeModulesTree {
    fn installed_dependencies(&self, package_path: &Path) -> Result<InstalledTable, LookupError> {
        let unreadable = |reason: String| LookupError::Unreadable {
            path: package_path.display().to_string(),
            reason,
        };

        if !package_path.is_dir() {
            return Err(unreadable("not a directory".to_string()));
        }

        let modules = package_path.join("node_modules");
        let mut table = InstalledTable::new();
        if !modules.is_dir() {
            return Ok(table);
        }

        let entries = fs::read_dir(&modules).map_err(|e| unreadable(e.to_string()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with('.') || !path.is_dir() {
                continue;
            }

            if file_name.starts_with('@') {
                let Ok(scoped) = fs::read_dir(&path) else {
                    continue;
                };
                for scoped_entry in scoped.flatten() {
                    if let Some((name, installed)) = Self::read_entry(&scoped_entry.path()) {
                        table.insert(name, installed);
                    }
                }
            } else if let Some((name, installed)) = Self::read_entry(&path) {
                table.insert(name, installed);
            }
        }

        tracing::trace!(
            "{} installed packages under {}",
            table.len(),
            modules.display()
        );
        Ok(table)
    }
}
