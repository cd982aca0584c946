//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting the selected feature cannot run without.
    #[error("{context} needs '{field}' to be set")]
    MissingField { field: String, context: String },

    #[error("bad value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
