mod cli;
mod config;
mod error;
mod navigator;
mod registry;
mod report;
mod resolver;
mod utils;
mod version;
mod wizard;
mod workflow;
mod workspace;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use error::DepwizError;
use report::ReportOptions;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::List {
            shared,
            all,
            wide,
            update_types,
            no_issues,
        } => {
            let report = ReportOptions {
                all: *all,
                wide: *wide,
                update_types: update_types.clone(),
                no_issues: *no_issues,
                ..ReportOptions::default()
            };
            workflow::execute_list(&cli.path, shared, report)
        }
        Commands::Interactive { shared } => workflow::execute_interactive(&cli.path, shared),
    };

    match result {
        Ok(()) => {}
        Err(DepwizError::UserCancelled) => {
            println!("\n{}", "Update cancelled by user.".yellow());
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}
