use std::path::PathBuf;
use thiserror::Error;

/// Boxed parser error, either from `serde_yaml` or `toml`.
pub type ParseSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError { path: PathBuf, source: ParseSource },

    #[error("config file '{0}' must contain a mapping at the top level")]
    NotAMapping(PathBuf),
}
