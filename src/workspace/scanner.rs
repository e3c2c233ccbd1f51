use crate::error::{DepwizError, Result};
use crate::utils::path_validator::PathValidator;
use crate::workspace::{DependencySpec, DependencyType, PackageManifest, PackageRef, Workspace};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// WorkspaceScanner discovers the root package and its workspace members
pub struct WorkspaceScanner {
    project_path: PathBuf,
}

impl WorkspaceScanner {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
        }
    }

    pub fn scan(&self) -> Result<Workspace> {
        let root_path = PathValidator::validate_project_path(&self.project_path)?;
        let root_manifest = root_path.join("package.json");
        if !root_manifest.exists() {
            return Err(DepwizError::ProjectValidation(format!(
                "package.json not found in {}",
                root_path.display()
            )));
        }

        let root_json = read_manifest(&root_manifest)?;
        let patterns = workspace_patterns(&root_json);

        let mut packages = vec![build_manifest(&root_path, &root_json, true)];
        for member in expand_patterns(&root_path, &patterns)? {
            if member == root_path {
                continue;
            }
            let json = read_manifest(&member.join("package.json"))?;
            if json.get("name").and_then(Value::as_str).is_none() {
                tracing::warn!("Skipping unnamed workspace package at {}", member.display());
                continue;
            }
            packages.push(build_manifest(&member, &json, false));
        }

        tracing::debug!("Discovered {} package(s)", packages.len());

        let hoisting_root = if patterns.is_empty() {
            None
        } else {
            Some(root_path)
        };

        Ok(Workspace {
            packages,
            hoisting_root,
        })
    }
}

fn read_manifest(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        DepwizError::ProjectValidation(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(DepwizError::ProjectValidation(format!(
            "{} is not a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// `workspaces` may be an array or `{ "packages": [...] }`.
fn workspace_patterns(root: &Value) -> Vec<String> {
    let list = match root.get("workspaces") {
        Some(Value::Array(list)) => list,
        Some(Value::Object(obj)) => match obj.get("packages") {
            Some(Value::Array(list)) => list,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    list.iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut members: Vec<PathBuf> = Vec::new();
    let mut excluded: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let (negated, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern.as_str()),
        };

        let full = root.join(pattern.trim_end_matches('/'));
        let full = full.to_string_lossy();
        let paths = glob::glob(&full).map_err(|e| {
            DepwizError::ProjectValidation(format!("Invalid workspace pattern '{pattern}': {e}"))
        })?;

        for path in paths.flatten() {
            if !path.join("package.json").is_file() || path.components().any(is_node_modules) {
                continue;
            }
            let target = if negated { &mut excluded } else { &mut members };
            if !target.contains(&path) {
                target.push(path);
            }
        }
    }

    members.retain(|path| !excluded.contains(path));
    members.sort();
    Ok(members)
}

fn is_node_modules(component: std::path::Component<'_>) -> bool {
    component.as_os_str() == "node_modules"
}

fn build_manifest(path: &Path, json: &Value, is_root: bool) -> PackageManifest {
    let name = json
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "root".to_string());

    PackageManifest {
        package: PackageRef {
            name,
            path: path.to_path_buf(),
            is_root,
        },
        dependencies: dependencies_from_manifest(json),
    }
}

/// Later dependency fields win when a name is declared more than once.
pub fn dependencies_from_manifest(json: &Value) -> Vec<DependencySpec> {
    let mut dependencies: Vec<DependencySpec> = Vec::new();

    for dep_type in DependencyType::ALL {
        let Some(section) = json.get(dep_type.manifest_field()).and_then(Value::as_object) else {
            continue;
        };
        for (name, spec) in section_entries(section) {
            let spec = DependencySpec::new(name, spec, dep_type);
            match dependencies.iter_mut().find(|d| d.name == spec.name) {
                Some(existing) => *existing = spec,
                None => dependencies.push(spec),
            }
        }
    }

    dependencies
}

fn section_entries(section: &Map<String, Value>) -> impl Iterator<Item = (&str, &str)> {
    section
        .iter()
        .filter_map(|(name, spec)| spec.as_str().map(|spec| (name.as_str(), spec)))
}
