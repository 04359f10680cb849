use std::path::PathBuf;

use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for calma-boot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid route '{route}': {reason}")]
    RouteDefinition { route: String, reason: String },

    #[error("invalid service '{service}': class reference must be a string")]
    ServiceDefinition { service: String },

    #[error("class '{0}' is not registered")]
    UnresolvedReference(String),

    #[error("service '{0}' is not registered")]
    ServiceNotFound(String),

    #[error("service '{service}' is not of the requested type")]
    ServiceType { service: String },

    #[error("setting '{key}' cannot be read as the requested type: {source}")]
    Setting {
        key: String,
        source: serde_yaml::Error,
    },

    #[error("application context requires a root directory")]
    MissingRoot,

    #[error("invalid root directory '{path}': {source}")]
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}
