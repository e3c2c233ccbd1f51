use crate::config::SortOrder;
use crate::version::Severity;
use crate::workspace::DependencyType;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depwiz",
    about = "Find and apply npm dependency upgrades across packages and monorepos",
    version,
    author
)]
pub struct Cli {
    /// Path to the project directory (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    pub path: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that resolves dependencies.
#[derive(Args, Debug, Clone, Default)]
pub struct SharedArgs {
    /// Only check these workspace packages
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub packages: Vec<String>,

    /// Only check these dependencies (exact names or globs like "@types/*")
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub dependencies: Vec<String>,

    /// Only check these dependency types (dev, prod, peer, optional)
    #[arg(long, value_delimiter = ',', value_name = "TYPE")]
    pub types: Vec<DependencyType>,

    /// Order of the report
    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    /// Maximum simultaneous registry requests
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Registry base URL
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Include dependencies on other packages of the workspace
    #[arg(long)]
    pub include_internal: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List dependencies with available upgrades
    List {
        #[command(flatten)]
        shared: SharedArgs,

        /// Show every dependency, including up-to-date ones
        #[arg(long)]
        all: bool,

        /// Show wanted, latest, type and workspace columns
        #[arg(long)]
        wide: bool,

        /// Only show these upgrade types (major, minor, patch)
        #[arg(long, value_delimiter = ',', value_name = "TYPE")]
        update_types: Vec<Severity>,

        /// Skip the issues section
        #[arg(long)]
        no_issues: bool,
    },

    /// Choose upgrades interactively and write them to package.json
    Interactive {
        #[command(flatten)]
        shared: SharedArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_flags() {
        let cli = Cli::try_parse_from([
            "depwiz",
            "-vv",
            "list",
            "--types",
            "dev,prod",
            "--dependencies",
            "@types/*",
            "--sort",
            "alphabetical",
            "--wide",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.path, ".");
        let Commands::List {
            shared,
            all,
            wide,
            update_types,
            no_issues,
        } = cli.command
        else {
            panic!("expected list");
        };
        assert!(wide);
        assert!(!all);
        assert_eq!(shared.types, vec![DependencyType::Dev, DependencyType::Prod]);
        assert_eq!(shared.dependencies, vec!["@types/*".to_string()]);
        assert_eq!(shared.sort, Some(SortOrder::Alphabetical));
        assert!(update_types.is_empty());
        assert!(!no_issues);
    }

    #[test]
    fn parses_report_filters() {
        let cli = Cli::try_parse_from([
            "depwiz",
            "list",
            "--update-types",
            "major,patch",
            "--no-issues",
        ])
        .unwrap();
        let Commands::List {
            update_types,
            no_issues,
            ..
        } = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(update_types, vec![Severity::Major, Severity::Patch]);
        assert!(no_issues);
        assert!(Cli::try_parse_from(["depwiz", "list", "--update-types", "none"]).is_err());
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(Cli::try_parse_from(["depwiz", "list", "--types", "bundled"]).is_err());
    }

    #[test]
    fn path_after_subcommand() {
        let cli =
            Cli::try_parse_from(["depwiz", "interactive", "-p", "/tmp/app", "--concurrency", "3"])
                .unwrap();
        assert_eq!(cli.path, "/tmp/app");
        let Commands::Interactive { shared } = cli.command else {
            panic!("expected interactive");
        };
        assert_eq!(shared.concurrency, Some(3));
    }
}
