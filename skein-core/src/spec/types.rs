//! Immutable application/service specification types.

// Layer 1: Standard library imports
use std::collections::{BTreeMap, BTreeSet};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::ServiceName;

/// Resource bounds for a single service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Memory in MiB. Must be > 0.
    pub memory_mib: u32,
    /// Virtual cores. Must be > 0.
    pub vcores: u32,
}

impl Resources {
    /// Whether this request fits within `cluster_max` on both dimensions.
    pub fn fits_within(&self, cluster_max: Resources) -> bool {
        self.memory_mib <= cluster_max.memory_mib && self.vcores <= cluster_max.vcores
    }
}

/// Whether a localized file is a plain file or an archive to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    File,
    Archive,
}

/// YARN localization visibility for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Application,
}

/// A file to localize into each container of a service before launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub source: String,
    pub kind: FileKind,
    pub visibility: Visibility,
    pub size: u64,
    pub timestamp: u64,
}

/// Immutable specification for one named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Desired initial instance count. May be 0.
    pub instances: u32,
    /// `-1` means unlimited, `0` means never restart, `n` means up to `n`
    /// restarts before the service is considered failed.
    pub max_restarts: i64,
    pub resources: Resources,
    /// Localization path -> file to stage before launch.
    pub files: BTreeMap<String, File>,
    pub env: BTreeMap<String, String>,
    /// Ordered, non-empty list of shell commands run in sequence.
    pub commands: Vec<String>,
    /// Names of services that must be ready (§4.D) before this service is
    /// launch-eligible.
    pub depends: Vec<ServiceName>,
}

impl ServiceSpec {
    /// Whether unlimited restarts are configured for this service.
    pub fn unlimited_restarts(&self) -> bool {
        self.max_restarts < 0
    }
}

/// Immutable, validated description of a multi-service application.
///
/// Once accepted by [`crate::spec::validate::validate`] this value is
/// shared read-only across the AM's components for the lifetime of the
/// application (§3: "An ApplicationSpec, once accepted, is shared
/// read-only across all components").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub name: String,
    pub queue: String,
    pub max_attempts: u32,
    pub tags: BTreeSet<String>,
    pub services: BTreeMap<ServiceName, ServiceSpec>,
}

impl ApplicationSpec {
    /// Look up a service by name.
    pub fn service(&self, name: &ServiceName) -> Option<&ServiceSpec> {
        self.services.get(name)
    }

    /// Total number of instances desired across all services at
    /// submission time, used to seed `ApplicationReport::progress`'s
    /// denominator.
    pub fn total_initial_instances(&self) -> u64 {
        self.services.values().map(|s| u64::from(s.instances)).sum()
    }
}
