use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("now playing surface is not supported in this environment")]
    Unsupported,

    #[error("now playing backend failed: {0}")]
    Backend(String),

    #[error("now playing backend is no longer running")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid tick interval: {0}")]
    InvalidTickInterval(String),
}
