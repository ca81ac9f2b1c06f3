//! # skein-core - Coordination engine for multi-service YARN applications
//!
//! `skein-core` is the engine room behind Skein's Application Master: the
//! container registry, the watchable key-value store dependent services
//! rendezvous on, the dependency scheduler, the YARN reconciler, and the
//! restart policy that together let a multi-service application describe
//! itself declaratively instead of writing a custom Application Master.
//!
//! # Quick Start
//!
//! ```rust
//! use skein_core::cluster::FakeCluster;
//! use skein_core::config::MasterConfig;
//! use skein_core::master::MasterState;
//! use skein_core::spec::{build_services, ApplicationSpec, Resources, ServiceSpec};
//! use std::collections::{BTreeMap, BTreeSet};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let worker = ServiceSpec {
//!     instances: 1,
//!     max_restarts: 0,
//!     resources: Resources { memory_mib: 256, vcores: 1 },
//!     files: BTreeMap::new(),
//!     env: BTreeMap::new(),
//!     commands: vec!["echo hello".to_string()],
//!     depends: vec![],
//! };
//! let spec = ApplicationSpec {
//!     name: "demo".to_string(),
//!     queue: "default".to_string(),
//!     max_attempts: 1,
//!     tags: BTreeSet::new(),
//!     services: build_services(vec![("worker".to_string(), worker)]).unwrap(),
//! };
//!
//! let cluster = Arc::new(FakeCluster::new(true));
//! let master = MasterState::new(
//!     spec,
//!     MasterConfig::default(),
//!     cluster,
//!     "127.0.0.1:0".to_string(),
//!     "alice".to_string(),
//! );
//! master.bootstrap("0.0.0.0", 0, "http://localhost/").await.unwrap();
//! # }
//! ```
//!
//! # Module Organization
//!
//! ## Data model
//! - [`spec`] - `ApplicationSpec`/`ServiceSpec` and their validation rules
//! - [`util`] - Newtype identifiers (`ApplicationId`, `ContainerId`, `ServiceName`)
//!
//! ## Coordination engines
//! - [`kv`] - The watchable key-value store services rendezvous on
//! - [`registry`] - The container lifecycle state machine
//! - [`scheduler`] - Dependency-driven launch eligibility
//! - [`reconciler`] - Matches cluster allocations to pending requests, drives launches
//! - [`restart`] - Bounded restart/failure policy
//! - [`master`] - `MasterState`, bundling the above for one running application
//!
//! ## Cluster boundary
//! - [`cluster`] - The abstract `ClusterInterface` trait and the in-memory `FakeCluster`
//!
//! ## Infrastructure
//! - [`api`] - Wire DTOs for the Master RPC surface
//! - [`config`] - `MasterConfig` defaults and builder
//! - [`error`] - The canonical error taxonomy
//!
//! # Architecture Principles
//!
//! ## No single coarse-grained lock
//! Each engine owns its own lock domain: `ContainerRegistry` and `KvStore`
//! each wrap their state in a `parking_lot::Mutex`, `DependencyScheduler`
//! uses a lock-free `DashSet` as a one-time edge latch. `MasterState`
//! composes handles to each rather than introducing a lock that spans all
//! of them.
//!
//! ## Derive eligibility, don't materialize it
//! "Is service D ready" has exactly one source of truth: the literal key
//! `D` being set in the [`kv`] store. The scheduler's internal state is a
//! memoization of an edge transition, never an independent answer to the
//! readiness question.

pub mod api;
pub mod cluster;
pub mod config;
pub mod error;
pub mod kv;
pub mod master;
pub mod reconciler;
pub mod registry;
pub mod restart;
pub mod scheduler;
pub mod spec;
pub mod util;

pub use cluster::{ClusterInterface, FakeCluster};
pub use config::MasterConfig;
pub use error::{ErrorKind, Result, SkeinError};
pub use kv::KvStore;
pub use master::{ApplicationReport, ApplicationState, MasterState};
pub use reconciler::Reconciler;
pub use registry::{CompletionOutcome, ContainerRecord, ContainerRegistry, ContainerState};
pub use restart::{RestartDecision, RestartPolicy};
pub use scheduler::DependencyScheduler;
pub use spec::{ApplicationSpec, ServiceSpec, ValidationError};
pub use util::{ApplicationId, ContainerId, ServiceName};
