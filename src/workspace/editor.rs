use crate::error::{DepwizError, Result};
use crate::workspace::DependencyType;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub dependency: String,
    pub previous: Option<String>,
    pub range: String,
    pub dep_type: DependencyType,
}

/// Rewrites dependency ranges inside a single `package.json`, keeping key
/// order and untouched fields intact.
pub struct ManifestEditor {
    manifest_path: PathBuf,
}

impl ManifestEditor {
    pub fn new<P: AsRef<Path>>(package_dir: P) -> Self {
        Self {
            manifest_path: package_dir.as_ref().join("package.json"),
        }
    }

    /// Set `dependency` to `range` in whichever field already declares it,
    /// or add it to the field of `new_type`.
    pub fn set_range(
        &self,
        dependency: &str,
        range: &str,
        new_type: DependencyType,
    ) -> Result<EditResult> {
        let mut doc = self.load_document()?;
        let root = doc.as_object_mut().ok_or_else(|| {
            DepwizError::ProjectValidation(format!(
                "{} is not a JSON object",
                self.manifest_path.display()
            ))
        })?;

        // last declaring field wins, as in `dependencies_from_manifest`
        let dep_type = DependencyType::ALL
            .into_iter()
            .rev()
            .find(|dep_type| declares(root, *dep_type, dependency))
            .unwrap_or(new_type);

        let section = root
            .entry(dep_type.manifest_field())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| {
                DepwizError::ProjectValidation(format!(
                    "'{}' in {} is not an object",
                    dep_type.manifest_field(),
                    self.manifest_path.display()
                ))
            })?;

        let previous = section
            .insert(dependency.to_string(), Value::String(range.to_string()))
            .and_then(|v| v.as_str().map(str::to_string));

        self.save_document(&doc)?;
        tracing::info!(
            "{}: {} {} -> {}",
            self.manifest_path.display(),
            dependency,
            previous.as_deref().unwrap_or("(new)"),
            range
        );

        Ok(EditResult {
            dependency: dependency.to_string(),
            previous,
            range: range.to_string(),
            dep_type,
        })
    }

    fn load_document(&self) -> Result<Value> {
        let content = fs::read_to_string(&self.manifest_path).map_err(|e| {
            DepwizError::ProjectValidation(format!(
                "Failed to read {}: {}",
                self.manifest_path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_document(&self, doc: &Value) -> Result<()> {
        let mut content = serde_json::to_string_pretty(doc)?;
        content.push('\n');
        fs::write(&self.manifest_path, content)?;
        Ok(())
    }
}

fn declares(root: &Map<String, Value>, dep_type: DependencyType, dependency: &str) -> bool {
    root.get(dep_type.manifest_field())
        .and_then(Value::as_object)
        .is_some_and(|section| section.contains_key(dependency))
}
