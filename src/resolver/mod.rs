use crate::registry::{Packument, RegistryLookup};
use crate::version::{self, Severity, VersionDiff};
use crate::workspace::{DependencyType, InstalledTable, TreeLookup, Workspace};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

pub mod filter;
pub mod pool;
pub mod progress;

pub use filter::NameFilter;
pub use progress::{LoaderBar, NoProgress, ProgressSink};

pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Only these packages; empty means all.
    pub filter_by_package_names: Vec<String>,
    /// Exact names or `*`/`?` globs; empty means all.
    pub filter_by_dependency_names: Vec<String>,
    pub filter_by_types: Vec<DependencyType>,
    pub sort_alphabetical: bool,
    pub concurrency_limit: usize,
    /// Leave out dependencies on other workspace packages.
    pub exclude_internal: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            filter_by_package_names: Vec::new(),
            filter_by_dependency_names: Vec::new(),
            filter_by_types: Vec::new(),
            sort_alphabetical: false,
            concurrency_limit: DEFAULT_CONCURRENCY,
            exclude_internal: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    pub installed: Option<String>,
    pub wanted: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeInfo {
    pub target: String,
    pub wanted: Option<String>,
    pub latest: Option<String>,
}

/// One row of the dependency report.
///
/// Unique per `(name, target range, installed version)`; every package
/// sharing that key is listed in `consuming_packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,
    pub dep_type: DependencyType,
    pub consuming_packages: BTreeSet<String>,
    pub version: VersionInfo,
    pub range: RangeInfo,
    pub is_hoisted: bool,
    pub is_internal: bool,
    /// Not installed, or the registry lookup failed.
    pub missing: bool,
    /// The registry lookup failed for this dependency.
    pub not_on_registry: bool,
    pub install_needed: bool,
    pub upgradable: bool,
    pub upgradable_to_wanted: bool,
    pub upgradable_to_latest: bool,
    pub diff: VersionDiff,
    pub versions: BTreeSet<String>,
    pub dist_tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    Internal,
    NotOnRegistry,
    InstallNeeded,
    Upgradable,
    UpToDate,
}

impl ResolvedDependency {
    pub fn target_range(&self) -> &str {
        &self.range.target
    }

    pub fn severity(&self) -> Severity {
        self.diff.severity
    }

    pub fn status(&self) -> DependencyStatus {
        if self.is_internal {
            DependencyStatus::Internal
        } else if self.not_on_registry {
            DependencyStatus::NotOnRegistry
        } else if self.install_needed {
            DependencyStatus::InstallNeeded
        } else if self.upgradable {
            DependencyStatus::Upgradable
        } else {
            DependencyStatus::UpToDate
        }
    }
}

/// A deduplicated dependency before its registry lookup.
#[derive(Debug, Clone)]
struct PendingDependency {
    name: String,
    dep_type: DependencyType,
    consuming_packages: BTreeSet<String>,
    target_range: String,
    installed_version: Option<String>,
    is_hoisted: bool,
    is_internal: bool,
}

/// DependencyResolver builds the deduplicated, enriched dependency report
pub struct DependencyResolver {
    registry: Arc<dyn RegistryLookup>,
    tree: Arc<dyn TreeLookup>,
}

impl DependencyResolver {
    pub fn new(registry: Arc<dyn RegistryLookup>, tree: Arc<dyn TreeLookup>) -> Self {
        Self { registry, tree }
    }

    /// Resolve every declared dependency of the workspace.
    ///
    /// Lookup failures are recorded on the affected dependency; this never
    /// fails as a whole.
    pub fn resolve(
        &self,
        workspace: &Workspace,
        options: &ResolveOptions,
        progress: &dyn ProgressSink,
    ) -> Vec<ResolvedDependency> {
        let pending = self.collect(workspace, options);
        let total = pending.len();
        tracing::debug!("Resolving {} unique dependencies", total);

        let completed = Mutex::new(0usize);
        let mut resolved = pool::run_bounded(pending, options.concurrency_limit, |dep| {
            let name = dep.name.clone();
            let result = self.enrich(dep);

            let mut done = completed.lock().unwrap_or_else(PoisonError::into_inner);
            *done += 1;
            progress.on_progress(*done, total, &name);
            result
        });

        sort_dependencies(&mut resolved, options.sort_alphabetical);
        resolved
    }

    fn collect(&self, workspace: &Workspace, options: &ResolveOptions) -> Vec<PendingDependency> {
        let hoisted = match &workspace.hoisting_root {
            Some(root) => self.load_installed(root),
            None => InstalledTable::new(),
        };

        let package_filter = &options.filter_by_package_names;
        let dependency_filter = NameFilter::new(&options.filter_by_dependency_names);

        let mut pending: Vec<PendingDependency> = Vec::new();
        let mut index: HashMap<(String, String, Option<String>), usize> = HashMap::new();

        for manifest in &workspace.packages {
            let package = &manifest.package;
            if !package_filter.is_empty() && !package_filter.contains(&package.name) {
                continue;
            }

            let local_table;
            let installed = if workspace.hoisting_root.is_some() && package.is_root {
                &hoisted
            } else {
                local_table = self.load_installed(&package.path);
                &local_table
            };

            for spec in &manifest.dependencies {
                if !dependency_filter.matches(&spec.name) {
                    continue;
                }
                if !options.filter_by_types.is_empty()
                    && !options.filter_by_types.contains(&spec.dep_type)
                {
                    continue;
                }

                let is_internal = workspace.contains(&spec.name);
                if is_internal && options.exclude_internal {
                    continue;
                }

                let local_entry = installed.get(&spec.name);
                let hoisted_entry = hoisted.get(&spec.name);
                let installed_version = local_entry.or(hoisted_entry).map(|p| p.version.clone());
                let is_hoisted = !is_internal && local_entry.is_none() && hoisted_entry.is_some();

                let key = (
                    spec.name.clone(),
                    spec.target_range.clone(),
                    installed_version.clone(),
                );
                match index.get(&key) {
                    Some(&existing) => {
                        pending[existing]
                            .consuming_packages
                            .insert(package.name.clone());
                    }
                    None => {
                        index.insert(key, pending.len());
                        pending.push(PendingDependency {
                            name: spec.name.clone(),
                            dep_type: spec.dep_type,
                            consuming_packages: BTreeSet::from([package.name.clone()]),
                            target_range: spec.target_range.clone(),
                            installed_version,
                            is_hoisted,
                            is_internal,
                        });
                    }
                }
            }
        }

        pending
    }

    fn load_installed(&self, path: &Path) -> InstalledTable {
        match self.tree.installed_dependencies(path) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("{}", e);
                InstalledTable::new()
            }
        }
    }

    fn enrich(&self, dep: PendingDependency) -> ResolvedDependency {
        if dep.is_internal {
            return internal_dependency(dep);
        }

        match self.registry.packument(&dep.name) {
            Ok(packument) => with_registry_data(dep, packument),
            Err(e) => {
                tracing::debug!("Lookup failed for {}: {}", dep.name, e);
                failed_dependency(dep)
            }
        }
    }
}

fn base(dep: PendingDependency) -> ResolvedDependency {
    ResolvedDependency {
        name: dep.name,
        dep_type: dep.dep_type,
        consuming_packages: dep.consuming_packages,
        version: VersionInfo {
            installed: dep.installed_version,
            wanted: None,
            latest: None,
        },
        range: RangeInfo {
            target: dep.target_range,
            wanted: None,
            latest: None,
        },
        is_hoisted: dep.is_hoisted,
        is_internal: dep.is_internal,
        missing: false,
        not_on_registry: false,
        install_needed: false,
        upgradable: false,
        upgradable_to_wanted: false,
        upgradable_to_latest: false,
        diff: VersionDiff::none(),
        versions: BTreeSet::new(),
        dist_tags: BTreeMap::new(),
    }
}

/// Workspace packages are never looked up nor required to be installed.
fn internal_dependency(dep: PendingDependency) -> ResolvedDependency {
    let mut resolved = base(dep);
    resolved.version.installed = None;
    resolved.range.wanted = Some(resolved.range.target.clone());
    resolved.range.latest = Some(resolved.range.target.clone());
    resolved
}

fn failed_dependency(dep: PendingDependency) -> ResolvedDependency {
    let mut resolved = base(dep);
    resolved.version.installed = None;
    resolved.missing = true;
    resolved.not_on_registry = true;
    resolved.install_needed = true;
    resolved.upgradable = true;
    resolved.upgradable_to_wanted = true;
    resolved.upgradable_to_latest = true;
    resolved
}

fn with_registry_data(dep: PendingDependency, packument: Packument) -> ResolvedDependency {
    let mut resolved = base(dep);
    let target = resolved.range.target.clone();
    let wildcard = version::leading_wildcard(&target);

    let wanted = version::max_satisfying(&packument.versions, &target);
    let latest = packument.latest().map(str::to_string);
    let wanted_range = wanted.as_ref().map(|v| format!("{wildcard}{v}"));
    let latest_range = latest.as_ref().map(|v| format!("{wildcard}{v}"));

    resolved.upgradable_to_wanted = wanted_range.as_ref().is_some_and(|r| *r != target);
    resolved.upgradable_to_latest = latest_range.as_ref().is_some_and(|r| *r != target);
    resolved.upgradable = resolved.upgradable_to_wanted || resolved.upgradable_to_latest;

    resolved.missing = resolved.version.installed.is_none();
    resolved.install_needed = match &resolved.version.installed {
        Some(installed) => !version::satisfies(installed, &target),
        None => true,
    };

    resolved.diff = if version::NpmRange::parse(&target).is_some() {
        version::classify(Some(&target), latest_range.as_deref())
    } else {
        VersionDiff::none()
    };
    resolved.version.wanted = wanted;
    resolved.version.latest = latest;
    resolved.range.wanted = wanted_range;
    resolved.range.latest = latest_range;
    resolved.versions = packument.versions;
    resolved.dist_tags = packument.dist_tags;
    resolved
}

fn sort_dependencies(dependencies: &mut [ResolvedDependency], alphabetical: bool) {
    if alphabetical {
        dependencies.sort_by(|a, b| a.name.cmp(&b.name));
    } else {
        dependencies.sort_by(|a, b| {
            a.severity()
                .rank()
                .cmp(&b.severity().rank())
                .then_with(|| a.name.cmp(&b.name))
        });
    }
}
