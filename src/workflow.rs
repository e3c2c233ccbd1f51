use crate::cli::SharedArgs;
use crate::config::Config;
use crate::error::Result;
use crate::registry::NpmRegistry;
use crate::report::{self, ReportOptions};
use crate::resolver::{DependencyResolver, LoaderBar, NoProgress, ResolvedDependency};
use crate::wizard::tui::Wizard;
use crate::workspace::{NodeModulesTree, Workspace, WorkspaceScanner};
use colored::Colorize;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

struct Session {
    config: Config,
    workspace: Workspace,
    registry: Arc<NpmRegistry>,
}

fn open_session(project_path: &Path, shared: &SharedArgs) -> Result<Session> {
    let config = Config::load(project_path)?.merge_cli(shared)?;
    tracing::debug!("Using registry {}", config.registry);

    let workspace = WorkspaceScanner::new(project_path).scan()?;
    if workspace.is_monorepo() {
        println!(
            "{}",
            format!("Found {} workspace package(s)", workspace.packages.len()).dimmed()
        );
    }

    let registry = Arc::new(NpmRegistry::new(&config.registry, config.timeout())?);
    Ok(Session {
        config,
        workspace,
        registry,
    })
}

fn resolve(session: &Session, shared: &SharedArgs) -> Vec<ResolvedDependency> {
    let resolver = DependencyResolver::new(session.registry.clone(), Arc::new(NodeModulesTree::new()));
    let options = session.config.resolve_options(shared);

    let dependencies = if std::io::stderr().is_terminal() {
        let loader = LoaderBar::new();
        let dependencies = resolver.resolve(&session.workspace, &options, &loader);
        loader.finish();
        dependencies
    } else {
        resolver.resolve(&session.workspace, &options, &NoProgress)
    };

    tracing::info!("Resolved {} dependencies", dependencies.len());
    dependencies
}

/// Execute the list workflow - print the upgrade report
pub fn execute_list<P: AsRef<Path>>(
    project_path: P,
    shared: &SharedArgs,
    options: ReportOptions,
) -> Result<()> {
    let session = open_session(project_path.as_ref(), shared)?;
    println!("{}", "Checking dependencies...".cyan().bold());

    let dependencies = resolve(&session, shared);
    let options = ReportOptions {
        monorepo: session.workspace.is_monorepo(),
        ..options
    };
    print!("{}", report::render(&dependencies, &options));

    Ok(())
}

/// Execute the interactive workflow - pick upgrades and write them
pub fn execute_interactive<P: AsRef<Path>>(project_path: P, shared: &SharedArgs) -> Result<()> {
    let session = open_session(project_path.as_ref(), shared)?;
    println!("{}", "Checking dependencies...".cyan().bold());

    let dependencies = resolve(&session, shared);
    let root = match (&session.workspace.hoisting_root, session.workspace.packages.first()) {
        (Some(root), _) => root.clone(),
        (None, Some(root)) => root.package.path.clone(),
        (None, None) => project_path.as_ref().to_path_buf(),
    };

    let wizard = Wizard::new(
        &session.workspace,
        &dependencies,
        session.registry.as_ref(),
        &root,
        session.config.limit,
    );
    let edits = wizard.run()?;

    if edits.is_empty() {
        println!("\n{}", "No updates were applied".yellow());
        return Ok(());
    }

    println!("\n{}", "Update Summary:".cyan().bold());
    for edit in &edits {
        println!(
            "  • {} {} → {} ({})",
            edit.dependency.white().bold(),
            edit.previous.as_deref().unwrap_or("(new)").red(),
            edit.range.green(),
            edit.dep_type.to_string().dimmed()
        );
    }
    println!(
        "\nRun {} to install the updated dependencies",
        "npm install".blue()
    );

    Ok(())
}
