//! The application-level projection returned by `getStatus`/`getApplications`
//! (§6 Daemon RPC), assembled from [`super::state::MasterState`].

// Layer 1: Standard library imports
use std::collections::BTreeSet;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::cluster::FinalStatus;
use crate::spec::Resources;
use crate::util::ApplicationId;

/// Whether the application, from the AM's own point of view, is still
/// running or has reached a terminal outcome. Distinct from
/// [`FinalStatus`], which classifies *which* terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationState {
    Running,
    Finished,
}

/// A point-in-time snapshot of an application's status, independent of
/// any RPC transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub id: ApplicationId,
    pub name: String,
    pub user: String,
    pub queue: String,
    pub tags: BTreeSet<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tracking_url: Option<String>,
    pub state: ApplicationState,
    pub final_status: FinalStatus,
    /// Fraction, in `[0, 1]`, of the application's initially-desired
    /// instances that have reached RUNNING or a terminal state.
    pub progress: f64,
    /// Aggregate resources currently held by RUNNING containers.
    pub usage: Resources,
    pub diagnostics: Option<String>,
    pub start_time: DateTime<Utc>,
    pub finish_time: Option<DateTime<Utc>>,
}
