use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepwizError {
    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Registry or filesystem access failed for a single package.
///
/// The resolver never propagates these; they are folded into the
/// affected dependency's record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("request for '{name}' failed: {reason}")]
    Request { name: String, reason: String },

    #[error("registry returned HTTP {status} for '{name}'")]
    Status { name: String, status: u16 },

    #[error("package '{0}' not found on the registry")]
    NotFound(String),

    #[error("malformed registry data for '{name}': {reason}")]
    Malformed { name: String, reason: String },

    #[error("cannot read installed packages at '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select at least one item")]
    EmptySelection,
}

pub type Result<T> = std::result::Result<T, DepwizError>;
