use crate::cli::SharedArgs;
use crate::error::{DepwizError, Result};
use crate::registry::npm::DEFAULT_REGISTRY;
use crate::resolver::{DEFAULT_CONCURRENCY, ResolveOptions};
use crate::workspace::DependencyType;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "depwiz.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most severe upgrade first
    #[default]
    Severity,
    /// By dependency name
    Alphabetical,
}

/// Settings from `depwiz.toml`, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub registry: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Rows shown at once in pickers.
    pub limit: usize,
    pub sort: SortOrder,
    pub dep_types: Vec<DependencyType>,
    pub include_internal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: 30,
            limit: 8,
            sort: SortOrder::Severity,
            dep_types: Vec::new(),
            include_internal: false,
        }
    }
}

impl Config {
    /// Load `depwiz.toml` from the project root, or defaults when absent.
    pub fn load<P: AsRef<Path>>(project_path: P) -> Result<Self> {
        let path = project_path.as_ref().join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("No {} found, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = Self::parse(&content).map_err(|e| match e {
            DepwizError::Config(msg) => {
                DepwizError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        tracing::debug!("Loaded {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| DepwizError::Config(e.message().to_string()))?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.concurrency == 0 {
            return Err(DepwizError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(DepwizError::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    /// Apply command-line flags on top of the file settings.
    pub fn merge_cli(mut self, args: &SharedArgs) -> Result<Self> {
        if let Some(registry) = &args.registry {
            self.registry = registry.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(sort) = args.sort {
            self.sort = sort;
        }
        if !args.types.is_empty() {
            self.dep_types = args.types.clone();
        }
        if args.include_internal {
            self.include_internal = true;
        }
        self.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolve_options(&self, args: &SharedArgs) -> ResolveOptions {
        ResolveOptions {
            filter_by_package_names: args.packages.clone(),
            filter_by_dependency_names: args.dependencies.clone(),
            filter_by_types: self.dep_types.clone(),
            sort_alphabetical: self.sort == SortOrder::Alphabetical,
            concurrency_limit: self.concurrency,
            exclude_internal: !self.include_internal,
        }
    }
}
