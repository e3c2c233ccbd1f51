use crate::error::LookupError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod editor;
pub mod installed;
pub mod scanner;

pub use editor::ManifestEditor;
pub use installed::NodeModulesTree;
pub use scanner::WorkspaceScanner;

/// One discoverable package in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub path: PathBuf,
    pub is_root: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyType {
    Prod,
    Dev,
    Peer,
    Optional,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::Dev,
        DependencyType::Prod,
        DependencyType::Peer,
        DependencyType::Optional,
    ];

    /// Field name in `package.json`.
    pub fn manifest_field(self) -> &'static str {
        match self {
            DependencyType::Prod => "dependencies",
            DependencyType::Dev => "devDependencies",
            DependencyType::Peer => "peerDependencies",
            DependencyType::Optional => "optionalDependencies",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Prod => "prod",
            DependencyType::Dev => "dev",
            DependencyType::Peer => "peer",
            DependencyType::Optional => "optional",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "dependencies" => Ok(DependencyType::Prod),
            "dev" | "devdependencies" => Ok(DependencyType::Dev),
            "peer" | "peerdependencies" => Ok(DependencyType::Peer),
            "optional" | "optionaldependencies" => Ok(DependencyType::Optional),
            other => Err(format!(
                "unknown dependency type '{other}' (expected dev, prod, peer or optional)"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for DependencyType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A dependency as declared by one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub target_range: String,
    pub dep_type: DependencyType,
}

impl DependencySpec {
    pub fn new(
        name: impl Into<String>,
        target_range: impl Into<String>,
        dep_type: DependencyType,
    ) -> Self {
        Self {
            name: name.into(),
            target_range: target_range.into(),
            dep_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub package: PackageRef,
    pub dependencies: Vec<DependencySpec>,
}

impl PackageManifest {
    pub fn declared(&self, name: &str) -> Option<&DependencySpec> {
        self.dependencies.iter().find(|dep| dep.name == name)
    }
}

/// The set of packages a resolution runs over.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub packages: Vec<PackageManifest>,
    /// Shared install location of a monorepo, if dependencies are hoisted.
    pub hoisting_root: Option<PathBuf>,
}

impl Workspace {
    pub fn is_monorepo(&self) -> bool {
        self.hoisting_root.is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.iter().any(|pkg| pkg.package.name == name)
    }

    pub fn package(&self, name: &str) -> Option<&PackageManifest> {
        self.packages.iter().find(|pkg| pkg.package.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub version: String,
}

pub type InstalledTable = BTreeMap<String, InstalledPackage>;

pub trait TreeLookup: Send + Sync {
    fn installed_dependencies(&self, package_path: &Path) -> Result<InstalledTable, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dependency_types() {
        assert_eq!("dev".parse::<DependencyType>(), Ok(DependencyType::Dev));
        assert_eq!(
            "peerDependencies".parse::<DependencyType>(),
            Ok(DependencyType::Peer)
        );
        assert!("bundled".parse::<DependencyType>().is_err());
    }

    #[test]
    fn manifest_fields_match_package_json() {
        assert_eq!(DependencyType::Prod.manifest_field(), "dependencies");
        assert_eq!(DependencyType::Optional.manifest_field(), "optionalDependencies");
    }
}
