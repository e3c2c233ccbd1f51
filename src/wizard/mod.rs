//! Interactive upgrade flow.
//!
//! [`WizardState`] only records choices and decides which step comes next;
//! [`tui`] owns the terminal and feeds it the outcome of each picker.

use crate::error::{Result, ValidationError};
use crate::navigator::ListItem;
use crate::registry::Packument;
use crate::resolver::ResolvedDependency;
use crate::utils::path_validator::PathValidator;
use crate::version::{self, VersionDiff};
use crate::workspace::editor::EditResult;
use crate::workspace::{DependencyType, ManifestEditor, Workspace};
use std::collections::BTreeSet;
use std::path::Path;

pub mod tui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Dependency,
    Version,
    Packages,
    /// Asked only when a package does not declare the dependency yet.
    DependencyType,
    Summary,
    Edit,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDependency {
    pub name: String,
    pub is_new: bool,
}

/// One queued change: set `dependency` to `version` in `packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub dependency: String,
    pub version: String,
    pub packages: Vec<String>,
    /// Field used for packages that do not declare the dependency yet.
    pub new_type: DependencyType,
    label: String,
}

impl PendingUpdate {
    pub fn new(
        dependency: impl Into<String>,
        version: impl Into<String>,
        packages: Vec<String>,
        new_type: DependencyType,
    ) -> Self {
        let dependency = dependency.into();
        let version = version.into();
        let label = format!("{dependency}@{version}");
        Self {
            dependency,
            version,
            packages,
            new_type,
            label,
        }
    }
}

impl ListItem for PendingUpdate {
    fn label(&self) -> &str {
        &self.label
    }
}

/// A version offered by the version picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOption {
    pub version: String,
    label: String,
}

impl ListItem for VersionOption {
    fn label(&self) -> &str {
        &self.label
    }

    fn search_key(&self) -> &str {
        &self.version
    }
}

/// A workspace package offered by the package picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOption {
    pub name: String,
    /// Range the package currently declares for the chosen dependency.
    pub declared: Option<String>,
    /// Change from `declared` to the range that would be written.
    pub diff: VersionDiff,
}

impl ListItem for PackageOption {
    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryChoice {
    AddAnother,
    Edit,
    Done,
}

impl SummaryChoice {
    pub const ALL: [SummaryChoice; 3] = [
        SummaryChoice::AddAnother,
        SummaryChoice::Edit,
        SummaryChoice::Done,
    ];
}

impl ListItem for SummaryChoice {
    fn label(&self) -> &str {
        match self {
            SummaryChoice::AddAnother => "Add another",
            SummaryChoice::Edit => "Edit updates",
            SummaryChoice::Done => "Done",
        }
    }
}

impl ListItem for DependencyType {
    fn label(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct WizardState {
    step: Step,
    dependency: Option<SelectedDependency>,
    version: Option<String>,
    packages: Vec<String>,
    updates: Vec<PendingUpdate>,
    message: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            step: Step::Dependency,
            dependency: None,
            version: None,
            packages: Vec::new(),
            updates: Vec::new(),
            message: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn dependency(&self) -> Option<&SelectedDependency> {
        self.dependency.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn updates(&self) -> &[PendingUpdate] {
        &self.updates
    }

    /// Validation or lookup notice for the current step.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn choose_dependency(&mut self, name: impl Into<String>, is_new: bool) {
        self.dependency = Some(SelectedDependency {
            name: name.into(),
            is_new,
        });
        self.message = None;
        self.step = Step::Version;
    }

    /// The chosen dependency could not be looked up; pick another one.
    pub fn versions_unavailable(&mut self, reason: impl Into<String>) {
        self.reset_selection();
        self.message = Some(reason.into());
        self.step = Step::Dependency;
    }

    pub fn choose_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
        self.message = None;
        self.step = Step::Packages;
    }

    /// Records the chosen packages. `adds_dependency` tells whether any of
    /// them does not declare the dependency yet.
    pub fn choose_packages(
        &mut self,
        packages: Vec<String>,
        adds_dependency: bool,
    ) -> std::result::Result<(), ValidationError> {
        if packages.is_empty() {
            self.message = Some(ValidationError::EmptySelection.to_string());
            return Err(ValidationError::EmptySelection);
        }

        self.packages = packages;
        self.message = None;
        if adds_dependency {
            self.step = Step::DependencyType;
        } else {
            self.queue_update(DependencyType::Prod);
        }
        Ok(())
    }

    pub fn choose_dependency_type(&mut self, dep_type: DependencyType) {
        self.queue_update(dep_type);
    }

    fn queue_update(&mut self, new_type: DependencyType) {
        if let (Some(dependency), Some(version)) = (self.dependency.take(), self.version.take()) {
            let packages = std::mem::take(&mut self.packages);
            self.updates.push(PendingUpdate::new(
                dependency.name,
                version,
                packages,
                new_type,
            ));
        }
        self.reset_selection();
        self.step = Step::Summary;
    }

    pub fn choose_summary(&mut self, choice: SummaryChoice) {
        self.reset_selection();
        self.step = match choice {
            SummaryChoice::AddAnother => Step::Dependency,
            SummaryChoice::Edit => Step::Edit,
            SummaryChoice::Done => Step::Done,
        };
    }

    /// Drops the queued update at `index`.
    pub fn remove_update(&mut self, index: usize) {
        if index < self.updates.len() {
            self.updates.remove(index);
        }
        self.step = if self.updates.is_empty() {
            Step::Dependency
        } else {
            Step::Summary
        };
    }

    pub fn leave_edit(&mut self) {
        self.step = Step::Summary;
    }

    fn reset_selection(&mut self) {
        self.dependency = None;
        self.version = None;
        self.packages.clear();
    }

    /// `(title, value)` pairs describing the choices made so far.
    pub fn header(&self) -> Vec<(&'static str, String)> {
        let mut lines = Vec::new();
        if let Some(dependency) = &self.dependency {
            let name = if dependency.is_new {
                format!("{} (new)", dependency.name)
            } else {
                dependency.name.clone()
            };
            lines.push(("Selected Dependency:", name));
        }
        if let Some(version) = &self.version {
            lines.push(("Selected Version:", version.clone()));
        }
        if !self.packages.is_empty() {
            lines.push(("Selected Packages:", self.packages.join(", ")));
        }
        lines
    }
}

/// Unique dependency names from a report, sorted.
pub fn dependency_options(report: &[ResolvedDependency]) -> Vec<String> {
    report
        .iter()
        .map(|dep| dep.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distribution tags first (`latest` leading), then every version newest
/// first.
pub fn version_options(packument: &Packument) -> Vec<VersionOption> {
    let mut tags: Vec<(&String, &String)> = packument.dist_tags.iter().collect();
    tags.sort_by_key(|(tag, _)| tag.as_str() != "latest");

    let tagged = tags.into_iter().map(|(tag, version)| VersionOption {
        version: version.clone(),
        label: format!("{version} ({tag})"),
    });
    let all = version::newest_first(&packument.versions)
        .into_iter()
        .map(|version| VersionOption {
            label: version.clone(),
            version,
        });

    tagged.chain(all).collect()
}

/// Range written for `version`, keeping the wildcard of `current`; new
/// dependencies get a caret.
pub fn range_for(current: Option<&str>, version: &str) -> String {
    let wildcard = match current {
        Some(current) => version::leading_wildcard(current),
        None => "^",
    };
    format!("{wildcard}{version}")
}

/// Workspace packages for the package picker plus the indexes to pre-select.
///
/// Packages already declaring `dependency` come first and start selected.
pub fn package_options(
    workspace: &Workspace,
    dependency: &str,
    version: &str,
) -> (Vec<PackageOption>, Vec<usize>) {
    let mut options: Vec<PackageOption> = workspace
        .packages
        .iter()
        .filter(|manifest| manifest.package.name != dependency)
        .map(|manifest| {
            let declared = manifest
                .declared(dependency)
                .map(|spec| spec.target_range.clone());
            let target = range_for(declared.as_deref(), version);
            let diff = version::classify(declared.as_deref(), Some(&target));
            PackageOption {
                name: manifest.package.name.clone(),
                declared,
                diff,
            }
        })
        .collect();

    options.sort_by(|a, b| {
        b.declared
            .is_some()
            .cmp(&a.declared.is_some())
            .then_with(|| a.name.cmp(&b.name))
    });

    let selected = options
        .iter()
        .enumerate()
        .filter(|(_, option)| option.declared.is_some())
        .map(|(index, _)| index)
        .collect();

    (options, selected)
}

/// Writes every queued update into the packages' `package.json` files.
pub fn apply_updates(
    workspace: &Workspace,
    root: &Path,
    updates: &[PendingUpdate],
) -> Result<Vec<EditResult>> {
    let mut results = Vec::new();

    for update in updates {
        for package_name in &update.packages {
            let Some(manifest) = workspace.package(package_name) else {
                tracing::warn!("Skipping unknown package '{}'", package_name);
                continue;
            };

            let package_dir = PathValidator::ensure_within(&manifest.package.path, root)?;
            let declared = manifest
                .declared(&update.dependency)
                .map(|spec| spec.target_range.as_str());
            let range = range_for(declared, &update.version);

            let result = ManifestEditor::new(&package_dir).set_range(
                &update.dependency,
                &range,
                update.new_type,
            )?;
            results.push(result);
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{DependencySpec, PackageManifest, PackageRef};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn manifest(name: &str, path: PathBuf, deps: &[(&str, &str)]) -> PackageManifest {
        PackageManifest {
            package: PackageRef {
                name: name.to_string(),
                path,
                is_root: false,
            },
            dependencies: deps
                .iter()
                .map(|(n, r)| DependencySpec::new(*n, *r, DependencyType::Prod))
                .collect(),
        }
    }

    fn picked(state: &mut WizardState, dependency: &str, version: &str) {
        state.choose_dependency(dependency, false);
        state.choose_version(version);
    }

    #[test]
    fn walks_through_to_summary() {
        let mut state = WizardState::new();
        assert_eq!(state.step(), Step::Dependency);

        state.choose_dependency("react", false);
        assert_eq!(state.step(), Step::Version);
        state.choose_version("18.2.0");
        assert_eq!(state.step(), Step::Packages);
        assert_eq!(state.header().len(), 2);

        state
            .choose_packages(vec!["web".to_string()], false)
            .unwrap();
        assert_eq!(state.step(), Step::Summary);
        assert_eq!(state.updates().len(), 1);
        assert_eq!(state.updates()[0].label(), "react@18.2.0");
        assert!(state.dependency().is_none());
        assert!(state.header().is_empty());
    }

    #[test]
    fn empty_package_selection_stays_put() {
        let mut state = WizardState::new();
        picked(&mut state, "react", "18.2.0");

        let err = state.choose_packages(Vec::new(), false).unwrap_err();
        assert_eq!(err, ValidationError::EmptySelection);
        assert_eq!(state.step(), Step::Packages);
        assert_eq!(state.message(), Some("Please select at least one item"));
        assert!(state.updates().is_empty());
    }

    #[test]
    fn new_dependency_asks_for_type() {
        let mut state = WizardState::new();
        state.choose_dependency("vitest", true);
        state.choose_version("1.6.0");
        state
            .choose_packages(vec!["web".to_string()], true)
            .unwrap();
        assert_eq!(state.step(), Step::DependencyType);

        state.choose_dependency_type(DependencyType::Dev);
        assert_eq!(state.step(), Step::Summary);
        assert_eq!(state.updates()[0].new_type, DependencyType::Dev);
    }

    #[test]
    fn summary_and_edit_transitions() {
        let mut state = WizardState::new();
        picked(&mut state, "a", "1.0.0");
        state.choose_packages(vec!["x".to_string()], false).unwrap();
        state.choose_summary(SummaryChoice::AddAnother);
        assert_eq!(state.step(), Step::Dependency);

        picked(&mut state, "b", "2.0.0");
        state.choose_packages(vec!["x".to_string()], false).unwrap();
        state.choose_summary(SummaryChoice::Edit);
        assert_eq!(state.step(), Step::Edit);

        state.leave_edit();
        assert_eq!(state.step(), Step::Summary);

        state.choose_summary(SummaryChoice::Edit);
        state.remove_update(0);
        assert_eq!(state.step(), Step::Summary);
        assert_eq!(state.updates()[0].dependency, "b");

        state.choose_summary(SummaryChoice::Edit);
        state.remove_update(0);
        assert_eq!(state.step(), Step::Dependency);

        state.choose_summary(SummaryChoice::Done);
        assert_eq!(state.step(), Step::Done);
    }

    #[test]
    fn lookup_failure_returns_to_dependency() {
        let mut state = WizardState::new();
        state.choose_dependency("no-such-package", true);
        state.versions_unavailable("package 'no-such-package' not found on the registry");
        assert_eq!(state.step(), Step::Dependency);
        assert!(state.dependency().is_none());
        assert!(state.message().is_some());
    }

    #[test]
    fn versions_list_tags_first() {
        let packument = Packument {
            versions: ["1.0.0", "1.2.0", "2.0.0", "2.1.0-beta.1"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            dist_tags: BTreeMap::from([
                ("beta".to_string(), "2.1.0-beta.1".to_string()),
                ("latest".to_string(), "2.0.0".to_string()),
            ]),
        };
        let options = version_options(&packument);
        let labels: Vec<&str> = options.iter().map(|o| o.label()).collect();
        assert_eq!(
            labels,
            vec![
                "2.0.0 (latest)",
                "2.1.0-beta.1 (beta)",
                "2.1.0-beta.1",
                "2.0.0",
                "1.2.0",
                "1.0.0"
            ]
        );
        assert_eq!(options[0].search_key(), "2.0.0");
    }

    #[test]
    fn ranges_keep_existing_wildcard() {
        assert_eq!(range_for(Some("~1.2.0"), "1.3.0"), "~1.3.0");
        assert_eq!(range_for(Some("1.2.0"), "1.3.0"), "1.3.0");
        assert_eq!(range_for(None, "1.3.0"), "^1.3.0");
    }

    #[test]
    fn packages_declaring_dependency_come_first() {
        let workspace = Workspace {
            packages: vec![
                manifest("api", PathBuf::from("/w/api"), &[]),
                manifest("web", PathBuf::from("/w/web"), &[("react", "^17.0.2")]),
                manifest("docs", PathBuf::from("/w/docs"), &[("react", "^18.0.0")]),
            ],
            hoisting_root: None,
        };

        let (options, selected) = package_options(&workspace, "react", "18.2.0");
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "web", "api"]);
        assert_eq!(selected, vec![0, 1]);
        assert_eq!(options[1].diff.severity, crate::version::Severity::Major);
        assert_eq!(options[1].diff.text(), "^18.2.0");
        assert!(!options[2].diff.is_change());
    }

    #[test]
    fn applies_updates_to_manifests() {
        let root = tempdir().unwrap();
        let web = root.path().join("packages/web");
        let api = root.path().join("packages/api");
        fs::create_dir_all(&web).unwrap();
        fs::create_dir_all(&api).unwrap();
        fs::write(
            web.join("package.json"),
            r#"{"name":"web","dependencies":{"react":"~17.0.2"}}"#,
        )
        .unwrap();
        fs::write(api.join("package.json"), r#"{"name":"api"}"#).unwrap();

        let workspace = Workspace {
            packages: vec![
                manifest("web", web.clone(), &[("react", "~17.0.2")]),
                manifest("api", api.clone(), &[]),
            ],
            hoisting_root: Some(root.path().to_path_buf()),
        };
        let updates = vec![PendingUpdate::new(
            "react",
            "18.2.0",
            vec!["web".to_string(), "api".to_string()],
            DependencyType::Peer,
        )];

        let results = apply_updates(&workspace, root.path(), &updates).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].range, "~18.2.0");
        assert_eq!(results[0].previous.as_deref(), Some("~17.0.2"));
        assert_eq!(results[1].range, "^18.2.0");
        assert_eq!(results[1].dep_type, DependencyType::Peer);

        let api_json = fs::read_to_string(api.join("package.json")).unwrap();
        assert!(api_json.contains("\"peerDependencies\""));
    }

    #[test]
    fn refuses_packages_outside_root() {
        let root = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        fs::write(elsewhere.path().join("package.json"), r#"{"name":"x"}"#).unwrap();

        let workspace = Workspace {
            packages: vec![manifest("x", elsewhere.path().to_path_buf(), &[])],
            hoisting_root: None,
        };
        let updates = vec![PendingUpdate::new(
            "chalk",
            "5.3.0",
            vec!["x".to_string()],
            DependencyType::Prod,
        )];

        assert!(apply_updates(&workspace, root.path(), &updates).is_err());
    }
}
