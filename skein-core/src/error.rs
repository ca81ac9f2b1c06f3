//! Canonical error taxonomy for the Application Master.
//!
//! Every gRPC-style error kind
//! (`INVALID_ARGUMENT`, `NOT_FOUND`, `FAILED_PRECONDITION`,
//! `RESOURCE_EXHAUSTED`, `UNAVAILABLE`, `CANCELLED`, `INTERNAL`) is
//! represented once here so that every transport the AM serves over —
//! the axum JSON body in `skein-am`, the CLI's exit code mapping in
//! `skein-cli` — derives from the same enum instead of re-inventing it.

// Layer 1: Standard library imports
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::ServiceName;

/// The coarse error classification surfaced on every Master RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Malformed request: bad spec, unknown service/key, bad scale count.
    InvalidArgument,
    /// Missing application/service/instance/key.
    NotFound,
    /// Operation is not legal in the current state (scale on a terminal
    /// service, shutdown already in progress).
    FailedPrecondition,
    /// Resource request exceeds the cluster-reported maximum.
    ResourceExhausted,
    /// Cluster interface unavailable; retried internally up to a bound.
    Unavailable,
    /// Client disconnected or the request deadline expired.
    Cancelled,
    /// Unexpected invariant violation.
    Internal,
}

/// Top-level error type for `skein-core` operations.
#[derive(Debug, Error)]
pub enum SkeinError {
    /// See [`ErrorKind::InvalidArgument`].
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// See [`ErrorKind::NotFound`].
    #[error("not found: {message}")]
    NotFound { message: String },

    /// See [`ErrorKind::FailedPrecondition`].
    #[error("failed precondition: {message}")]
    FailedPrecondition { message: String },

    /// See [`ErrorKind::ResourceExhausted`].
    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    /// See [`ErrorKind::Unavailable`]. Carries the cluster operation name
    /// so diagnostics can name what failed (§7: "diagnostics string naming
    /// the cluster operation that failed").
    #[error("cluster interface unavailable during '{operation}': {source}")]
    Unavailable {
        operation: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// See [`ErrorKind::Cancelled`].
    #[error("cancelled")]
    Cancelled,

    /// See [`ErrorKind::Internal`]. Always logged with full context at the
    /// call site before being returned.
    #[error("internal invariant violation: {message}")]
    Internal { message: String },
}

impl SkeinError {
    /// Classify this error into the fixed [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::FailedPrecondition { .. } => ErrorKind::FailedPrecondition,
            Self::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Build a [`SkeinError::NotFound`] naming a missing service.
    pub fn unknown_service(name: &ServiceName) -> Self {
        Self::NotFound {
            message: format!("unknown service '{name}'"),
        }
    }

    /// Build a [`SkeinError::NotFound`] naming a missing key-value key.
    pub fn unknown_key(key: &str) -> Self {
        Self::NotFound {
            message: format!("key '{key}' not set"),
        }
    }
}

/// Convenience alias used throughout `skein-core`.
pub type Result<T> = std::result::Result<T, SkeinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = SkeinError::NotFound {
            message: "x".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
