use std::path::PathBuf;

/// Errors surfaced by the command line driver.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Host(#[from] mh_host::HostError),

    #[error(transparent)]
    Bind(#[from] mh_abi::BindError),

    #[error("Failed to read scenario file: {path}")]
    ScenarioRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
