//! Container state machine and record types (§3 "Container record").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::ContainerId;

/// The container lifecycle state machine.
///
/// `WAITING -> REQUESTED -> RUNNING -> {SUCCEEDED, FAILED, KILLED}`.
/// `WAITING` is also the state of instances that exist only because their
/// service is dependency-blocked. Transitions not listed in
/// [`ContainerState::can_transition_to`] are rejected, not silently
/// coerced (§9 design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Waiting,
    Requested,
    Running,
    Succeeded,
    Failed,
    Killed,
}

impl ContainerState {
    /// Terminal states: no further transitions are legal from here.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Killed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ContainerState::*;
        match (self, next) {
            (Waiting, Requested) => true,
            (Requested, Running) => true,
            (Requested, Killed) => true,
            (Waiting, Killed) => true,
            (Running, Succeeded | Failed | Killed) => true,
            _ => false,
        }
    }
}

/// A single container instance belonging to a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub service: String,
    /// 0-based index within the service; monotonically increasing, never
    /// reused across restarts (§3: "a new instance record is created for a
    /// restart rather than reusing the slot").
    pub instance: u32,
    pub state: ContainerState,
    pub yarn_container_id: Option<ContainerId>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    /// Set on SUCCEEDED/FAILED/KILLED; carries the cluster's exit status
    /// and diagnostics for §7 failure propagation.
    pub diagnostics: Option<String>,
}

impl ContainerRecord {
    pub fn new(service: impl Into<String>, instance: u32) -> Self {
        Self {
            service: service.into(),
            instance,
            state: ContainerState::Waiting,
            yarn_container_id: None,
            start_time: None,
            finish_time: None,
            diagnostics: None,
        }
    }
}
