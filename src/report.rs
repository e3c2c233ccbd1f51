use crate::resolver::{DependencyStatus, ResolvedDependency};
use crate::version::{self, Severity, VersionDiff};
use colored::Colorize;

const MISSING: &str = "-";
const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Show every dependency, not only the upgradable ones.
    pub all: bool,
    /// Add the Wanted/Latest/Type columns (and Hoisted/In for monorepos).
    pub wide: bool,
    pub monorepo: bool,
    /// Only list upgrades of these severities; empty lists every one.
    pub update_types: Vec<Severity>,
    pub no_issues: bool,
}

/// Dependencies that need attention before they can be upgraded.
#[derive(Debug, Default)]
pub struct Issues<'a> {
    pub install_needed: Vec<&'a ResolvedDependency>,
    pub not_on_registry: Vec<&'a ResolvedDependency>,
}

impl Issues<'_> {
    pub fn is_empty(&self) -> bool {
        self.install_needed.is_empty() && self.not_on_registry.is_empty()
    }
}

pub fn visible_rows<'a>(
    dependencies: &'a [ResolvedDependency],
    options: &ReportOptions,
) -> Vec<&'a ResolvedDependency> {
    dependencies
        .iter()
        .filter(|dep| options.all || dep.upgradable)
        .filter(|dep| {
            options.update_types.is_empty() || options.update_types.contains(&dep.severity())
        })
        .collect()
}

pub fn issues(dependencies: &[ResolvedDependency]) -> Issues<'_> {
    let mut issues = Issues::default();
    for dep in dependencies {
        match dep.status() {
            DependencyStatus::NotOnRegistry => issues.not_on_registry.push(dep),
            DependencyStatus::InstallNeeded => issues.install_needed.push(dep),
            _ => {}
        }
    }
    issues
}

/// Plain text of the upgrade cell, e.g. `^2.0.0`.
pub fn upgrade_text(dep: &ResolvedDependency) -> String {
    if dep.not_on_registry {
        return UNKNOWN.to_string();
    }
    if !dep.diff.is_change() {
        return dep.range.latest.clone().unwrap_or_else(|| MISSING.to_string());
    }
    dep.diff.text()
}

/// The upgrade with the changed parts coloured by severity.
pub fn colored_diff(diff: &VersionDiff) -> String {
    let changed = match diff.severity.color() {
        Some(color) => diff.colored.color(color).to_string(),
        None => diff.colored.clone(),
    };
    format!(
        "{}{}{}{}",
        diff.wildcard,
        diff.uncolored,
        diff.separator(),
        changed
    )
}

struct Column {
    header: &'static str,
    cell: fn(&ResolvedDependency) -> String,
}

fn columns(options: &ReportOptions) -> Vec<Column> {
    let mut columns = vec![
        Column {
            header: "Name",
            cell: |dep| dep.name.clone(),
        },
        Column {
            header: "Target",
            cell: |dep| dep.target_range().to_string(),
        },
        Column {
            header: "Installed",
            cell: |dep| or_missing(&dep.version.installed),
        },
    ];

    if options.wide {
        columns.push(Column {
            header: "Wanted",
            cell: |dep| or_missing(&dep.version.wanted),
        });
        columns.push(Column {
            header: "Latest",
            cell: |dep| or_missing(&dep.version.latest),
        });
    }

    columns.push(Column {
        header: "Upgrade",
        cell: upgrade_text,
    });

    if options.wide {
        columns.push(Column {
            header: "Type",
            cell: |dep| dep.dep_type.to_string(),
        });
        if options.monorepo {
            columns.push(Column {
                header: "Hoisted",
                cell: |dep| (if dep.is_hoisted { "yes" } else { "no" }).to_string(),
            });
            columns.push(Column {
                header: "In",
                cell: |dep| {
                    dep.consuming_packages
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            });
        }
    }

    columns
}

fn or_missing(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_string())
}

/// Renders rows as a padded table; `style` may decorate a cell after
/// padding so escape codes never skew the widths.
fn render_table(
    rows: &[&ResolvedDependency],
    columns: &[Column],
    style: impl Fn(&str, &ResolvedDependency, String) -> String,
) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|dep| columns.iter().map(|column| (column.cell)(dep)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column.header, width = width))
        .collect();
    out.push_str(&format!("  {}\n", header.join("  ").trim_end().bold()));

    for (dep, row) in rows.iter().zip(&cells) {
        let line: Vec<String> = columns
            .iter()
            .zip(row)
            .zip(&widths)
            .map(|((column, cell), width)| {
                let pad = width.saturating_sub(cell.chars().count());
                let styled = style(column.header, dep, cell.clone());
                format!("{}{}", styled, " ".repeat(pad))
            })
            .collect();
        out.push_str(&format!("  {}\n", line.join("  ").trim_end()));
    }

    out
}

fn style_cell(header: &str, dep: &ResolvedDependency, cell: String) -> String {
    match header {
        "Name" if dep.not_on_registry => cell.red().to_string(),
        "Name" => cell.bold().to_string(),
        "Upgrade" if dep.not_on_registry => cell.dimmed().to_string(),
        "Upgrade" if dep.diff.is_change() => colored_diff(&dep.diff),
        "Target" if dep.diff.is_change() => {
            let current =
                version::classify_current(Some(dep.target_range()), dep.range.latest.as_deref());
            if current.is_change() {
                colored_diff(&current)
            } else {
                cell
            }
        }
        "Installed" if dep.install_needed && !dep.is_internal => cell.yellow().to_string(),
        _ => cell,
    }
}

pub fn render(dependencies: &[ResolvedDependency], options: &ReportOptions) -> String {
    let rows = visible_rows(dependencies, options);
    let mut out = String::new();

    if rows.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            "✨ All dependencies are up to date!".green().bold()
        ));
    } else {
        out.push('\n');
        out.push_str(&render_table(&rows, &columns(options), style_cell));
    }

    let issues = issues(dependencies);
    if options.no_issues || issues.is_empty() {
        return out;
    }

    let problem_columns: Vec<Column> = columns(&ReportOptions::default());
    out.push_str(&format!("\n{}\n", "Issues Detected:".red().bold()));

    if !issues.install_needed.is_empty() {
        out.push_str(&format!("{}\n", "dependencies requiring install".red()));
        out.push_str(&render_table(
            &issues.install_needed,
            &problem_columns,
            style_cell,
        ));
    }

    if !issues.not_on_registry.is_empty() {
        out.push_str(&format!(
            "{}\n",
            "dependencies missing from the registry".red()
        ));
        out.push_str(&render_table(
            &issues.not_on_registry,
            &problem_columns,
            style_cell,
        ));
    }

    if !issues.install_needed.is_empty() {
        out.push_str(&format!(
            "Run {} to resolve dependency issues\n",
            "npm install".blue()
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{RangeInfo, VersionInfo};
    use crate::version::classify;
    use crate::workspace::DependencyType;
    use std::collections::{BTreeMap, BTreeSet};

    fn dependency(name: &str, target: &str, installed: Option<&str>, latest: &str) -> ResolvedDependency {
        let latest_range = format!("^{latest}");
        let diff = classify(Some(target), Some(&latest_range));
        ResolvedDependency {
            name: name.to_string(),
            dep_type: DependencyType::Prod,
            consuming_packages: BTreeSet::from(["app".to_string(), "web".to_string()]),
            version: VersionInfo {
                installed: installed.map(str::to_string),
                wanted: installed.map(str::to_string),
                latest: Some(latest.to_string()),
            },
            range: RangeInfo {
                target: target.to_string(),
                wanted: Some(target.to_string()),
                latest: Some(latest_range.clone()),
            },
            is_hoisted: false,
            is_internal: false,
            missing: installed.is_none(),
            not_on_registry: false,
            install_needed: installed.is_none(),
            upgradable: latest_range != target,
            upgradable_to_wanted: false,
            upgradable_to_latest: latest_range != target,
            diff,
            versions: BTreeSet::new(),
            dist_tags: BTreeMap::new(),
        }
    }

    fn failed(name: &str) -> ResolvedDependency {
        let mut dep = dependency(name, "^1.0.0", None, "1.0.0");
        dep.not_on_registry = true;
        dep.upgradable = true;
        dep.version = VersionInfo::default();
        dep.range.wanted = None;
        dep.range.latest = None;
        dep.diff = VersionDiff::none();
        dep
    }

    #[test]
    fn only_upgradable_rows_by_default() {
        let deps = vec![
            dependency("chalk", "^5.0.0", Some("5.0.0"), "5.0.0"),
            dependency("react", "^17.0.0", Some("17.0.2"), "18.2.0"),
        ];
        let rows = visible_rows(&deps, &ReportOptions::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "react");
        let all = ReportOptions {
            all: true,
            ..ReportOptions::default()
        };
        assert_eq!(visible_rows(&deps, &all).len(), 2);
    }

    #[test]
    fn update_types_narrow_the_rows() {
        let deps = vec![
            dependency("react", "^17.0.0", Some("17.0.2"), "18.2.0"),
            dependency("chalk", "^5.0.0", Some("5.0.0"), "5.3.0"),
            dependency("debug", "^4.3.1", Some("4.3.1"), "4.3.4"),
        ];
        let options = ReportOptions {
            update_types: vec![Severity::Minor, Severity::Patch],
            ..ReportOptions::default()
        };
        let names: Vec<&str> = visible_rows(&deps, &options)
            .iter()
            .map(|dep| dep.name.as_str())
            .collect();
        assert_eq!(names, vec!["chalk", "debug"]);

        let majors = ReportOptions {
            update_types: vec![Severity::Major],
            ..ReportOptions::default()
        };
        let out = render(&deps, &majors);
        assert!(out.contains("react"));
        assert!(!out.contains("chalk"));
    }

    #[test]
    fn no_issues_hides_the_issues_section() {
        let deps = vec![
            dependency("react", "^17.0.0", Some("17.0.2"), "18.2.0"),
            dependency("chalk", "^5.0.0", None, "5.0.0"),
            failed("left-pad"),
        ];
        let options = ReportOptions {
            no_issues: true,
            ..ReportOptions::default()
        };
        let out = render(&deps, &options);
        assert!(out.contains("react"));
        assert!(!out.contains("Issues Detected"));
        assert!(!out.contains("npm install"));
        assert!(render(&deps, &ReportOptions::default()).contains("Issues Detected"));
    }

    #[test]
    fn issues_are_split_by_cause() {
        let deps = vec![
            dependency("chalk", "^5.0.0", None, "5.0.0"),
            failed("left-pad"),
            dependency("react", "^18.0.0", Some("18.2.0"), "18.2.0"),
        ];
        let issues = issues(&deps);
        assert_eq!(issues.install_needed.len(), 1);
        assert_eq!(issues.install_needed[0].name, "chalk");
        assert_eq!(issues.not_on_registry.len(), 1);
        assert_eq!(issues.not_on_registry[0].name, "left-pad");
    }

    #[test]
    fn upgrade_cell_text() {
        let react = dependency("react", "^17.0.0", Some("17.0.2"), "18.2.0");
        assert_eq!(upgrade_text(&react), "^18.2.0");
        assert_eq!(upgrade_text(&failed("left-pad")), "unknown");
    }

    #[test]
    fn report_lists_failed_dependencies() {
        let deps = vec![
            dependency("react", "^17.0.0", Some("17.0.2"), "18.2.0"),
            failed("left-pad"),
        ];
        let out = render(&deps, &ReportOptions::default());
        assert!(out.contains("react"));
        assert!(out.contains("Issues Detected:"));
        assert!(out.contains("dependencies missing from the registry"));
        assert!(out.contains("left-pad"));
    }

    #[test]
    fn up_to_date_message() {
        let deps = vec![dependency("chalk", "^5.0.0", Some("5.0.0"), "5.0.0")];
        let out = render(&deps, &ReportOptions::default());
        assert!(out.contains("All dependencies are up to date"));
        assert!(!out.contains("Issues Detected"));
    }

    #[test]
    fn wide_monorepo_columns() {
        let deps = vec![dependency("react", "^17.0.0", Some("17.0.2"), "18.2.0")];
        let options = ReportOptions {
            wide: true,
            monorepo: true,
            ..ReportOptions::default()
        };
        let headers: Vec<&str> = columns(&options).iter().map(|c| c.header).collect();
        assert_eq!(
            headers,
            vec!["Name", "Target", "Installed", "Wanted", "Latest", "Upgrade", "Type", "Hoisted", "In"]
        );
        assert!(render(&deps, &options).contains("app, web"));
    }
}
