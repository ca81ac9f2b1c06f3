//! CLI error type and its mapping onto the exit codes named in the CLI
//! surface: 0 success, 1 user error, 2 cluster/AM unreachable, 3 not found.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unreachable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code for this error, per the CLI surface's
    /// `0 success; 1 user error; 2 cluster/AM unreachable; 3 not found`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 3,
            Self::Unreachable(_) => 2,
            _ => 1,
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(err.to_string())
    }
}

/// Classify a [`skein_client::ClientError`] onto the CLI's exit-code
/// buckets rather than flattening every client failure into one variant.
impl From<skein_client::ClientError> for CliError {
    fn from(err: skein_client::ClientError) -> Self {
        use skein_client::ClientError::*;
        match err {
            UnknownApplication(id) => {
                CliError::NotFound(format!("no known application '{id}'"))
            }
            NotYetRegistered(id) => CliError::Unreachable(format!(
                "application '{id}' has not yet registered its Application Master"
            )),
            Timeout { id, waited_secs } => CliError::Unreachable(format!(
                "timed out after {waited_secs}s waiting for application '{id}' to start"
            )),
            Transport(err) => CliError::Unreachable(err.to_string()),
            Master { kind, message } => match kind {
                skein_core::ErrorKind::NotFound => CliError::NotFound(message),
                skein_core::ErrorKind::Unavailable => CliError::Unreachable(message),
                skein_core::ErrorKind::InvalidArgument
                | skein_core::ErrorKind::FailedPrecondition
                | skein_core::ErrorKind::ResourceExhausted => CliError::InvalidArgument(message),
                skein_core::ErrorKind::Cancelled | skein_core::ErrorKind::Internal => {
                    CliError::Other(anyhow::anyhow!(message))
                }
            },
            PointerStore(err) => CliError::Io(err),
            Serialization(err) => CliError::Serialization(err),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        CliError::Unreachable(err.to_string())
    }
}
