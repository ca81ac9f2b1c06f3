//! Error taxonomy for the client-side Daemon contract.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("application {0} is not yet registered with its Application Master")]
    NotYetRegistered(String),

    #[error("timed out waiting for application {id} to start after {waited_secs}s")]
    Timeout { id: String, waited_secs: u64 },

    #[error("no pointer file found for application {0}")]
    UnknownApplication(String),

    #[error("YARN ResourceManager request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pointer-file cache error: {0}")]
    PointerStore(#[from] std::io::Error),

    #[error("malformed pointer-file or RPC payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Application Master returned an error: {kind:?}: {message}")]
    Master {
        kind: skein_core::ErrorKind,
        message: String,
    },
}
