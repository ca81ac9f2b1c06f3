//! Wire DTOs for the Master RPC surface (§6), shared between `skein-am`'s
//! axum handlers and `skein-client`'s HTTP calls so both sides serialize
//! the exact same shapes.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::cluster::FinalStatus;
use crate::error::ErrorKind;
use crate::registry::{ContainerRecord, ContainerState};
use crate::spec::{ApplicationSpec, ServiceSpec};

/// Body of every failed Master RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvGetQuery {
    pub wait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvGetResponse {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvSetRequest {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvListResponse {
    pub entries: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetServiceResponse {
    pub service: ServiceSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetApplicationSpecResponse {
    pub spec: ApplicationSpec,
}

/// Query parameters for `getContainers`; both filters are optional and
/// compose with AND semantics (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetContainersQuery {
    pub states: Option<Vec<ContainerState>>,
    pub services: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetContainersResponse {
    pub containers: Vec<ContainerRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleRequest {
    pub instances: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownRequest {
    pub final_status: FinalStatus,
    pub diagnostics: String,
}
