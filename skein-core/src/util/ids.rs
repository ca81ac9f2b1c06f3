// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Unique identifier for a submitted application.
///
/// # Example
/// ```rust
/// use skein_core::util::ApplicationId;
///
/// let id1 = ApplicationId::new();
/// let id2 = ApplicationId::new();
/// assert_ne!(id1, id2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    /// Generate a new random application id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an id from an existing UUID (e.g. one reported by the cluster).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "application_{}", self.0.simple())
    }
}

/// Opaque container identifier assigned by the cluster at allocation bind
/// time. Unlike [`ApplicationId`] this is not minted locally: it is
/// whatever the cluster interface hands back from `onContainersAllocated`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Wrap a cluster-supplied container id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty service name.
///
/// Kept as a thin newtype (rather than a bare `String`) so that every call
/// site that takes a service name has already gone through
/// [`ServiceName::new`]'s validation once, instead of re-checking emptiness
/// at every lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Construct a service name, rejecting the empty string.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidServiceName> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidServiceName);
        }
        Ok(Self(name))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when constructing a [`ServiceName`] from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("service name must not be empty")]
pub struct InvalidServiceName;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_id_unique() {
        let a = ApplicationId::new();
        let b = ApplicationId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn application_id_display_has_prefix() {
        let id = ApplicationId::new();
        assert!(format!("{id}").starts_with("application_"));
    }

    #[test]
    fn service_name_rejects_empty() {
        assert!(ServiceName::new("").is_err());
        assert!(ServiceName::new("worker").is_ok());
    }

    #[test]
    fn container_id_roundtrips_string() {
        let id = ContainerId::new("container_1234_0001_01_000002");
        assert_eq!(id.as_str(), "container_1234_0001_01_000002");
    }
}
