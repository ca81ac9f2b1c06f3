//! The abstract cluster interface (§6): the narrow capability surface the
//! reconciler drives. Concrete implementations — a real YARN
//! ResourceManager/NodeManager client, or the in-memory [`super::fake`]
//! used by tests — live outside `skein-core`; this crate only depends on
//! the trait.

// Layer 1: Standard library imports
use std::collections::BTreeMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::spec::{File, Resources};
use crate::util::ContainerId;

/// Final application status reported to the cluster at `unregister` time
/// and surfaced on [`crate::master::report::ApplicationReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FinalStatus {
    Succeeded,
    Failed,
    Killed,
    Undefined,
}

/// A pending request for one container's worth of resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub service: String,
    pub instance: u32,
    pub resources: Resources,
}

/// Everything a container needs staged before it can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    pub files: BTreeMap<String, File>,
    pub env: BTreeMap<String, String>,
    pub commands: Vec<String>,
}

/// A granted allocation, matched to a pending [`ResourceRequest`] by the
/// reconciler on arrival (§4.E: "pops the oldest compatible pending
/// instance").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocated {
    pub container_id: ContainerId,
    pub resources: Resources,
}

/// A container completion notification (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub container_id: ContainerId,
    pub exit_status: i32,
    /// Whether this completion was a user-initiated kill/preemption
    /// rather than a natural process exit, per the §6 completion
    /// classification (killed/preempted -> KILLED, not FAILED).
    pub preempted: bool,
    pub diagnostics: String,
}

/// A batch of events observed since the last poll (§6: `onContainersAllocated`,
/// `onContainersCompleted`, `onShutdownRequest`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterEvents {
    pub allocated: Vec<Allocated>,
    pub completed: Vec<Completed>,
    pub shutdown_requested: bool,
}

/// Errors a [`ClusterInterface`] implementation can surface. The
/// reconciler treats every variant as retryable (§7 `UNAVAILABLE`) except
/// where noted.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("cluster interface transport error: {0}")]
    Transport(String),
}

/// The narrow capability surface the AM needs from the cluster (§6).
///
/// Deliberately excludes anything about *how* containers are scheduled —
/// that is the YARN ResourceManager's job, out of scope per §1.
#[async_trait]
pub trait ClusterInterface: Send + Sync {
    /// Register this AM with the cluster, advertising where its Master
    /// RPC server and web tracking UI can be reached.
    async fn register(
        &self,
        host: &str,
        port: u16,
        tracking_url: &str,
    ) -> Result<(), ClusterError>;

    /// Unregister at application termination.
    async fn unregister(
        &self,
        final_status: FinalStatus,
        diagnostics: &str,
    ) -> Result<(), ClusterError>;

    /// Ask the cluster for containers matching each request. Requests are
    /// not correlated 1:1 with grants by id; the reconciler matches
    /// grants to pending requests by resource shape in FIFO order.
    async fn request_containers(
        &self,
        requests: Vec<ResourceRequest>,
    ) -> Result<(), ClusterError>;

    /// Give back a container the AM no longer needs (scale-down of a
    /// still-REQUESTED instance).
    async fn release_container(&self, container_id: &ContainerId) -> Result<(), ClusterError>;

    /// Launch a granted container with its localized files, environment,
    /// and commands.
    async fn launch_container(
        &self,
        container_id: &ContainerId,
        context: LaunchContext,
    ) -> Result<(), ClusterError>;

    /// Issue a stop request for a running container (§4.C `kill`).
    async fn stop_container(&self, container_id: &ContainerId) -> Result<(), ClusterError>;

    /// Block until at least one event is available, or return an empty
    /// batch after an implementation-defined timeout so the reconciler's
    /// loop can still observe cancellation.
    async fn poll_events(&self) -> ClusterEvents;
}
