//! Top-level error type for the `skein-am` binary: configuration loading,
//! server bind failures, and bootstrap against the cluster.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AmError>;

#[derive(Debug, Error)]
pub enum AmError {
    #[error("failed to read configuration file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to parse application spec: {0}")]
    SpecParse(#[from] serde_json::Error),

    #[error("failed to bind Master RPC server: {0}")]
    Bind(#[source] std::io::Error),

    #[error(transparent)]
    Coordination(#[from] skein_core::SkeinError),
}
