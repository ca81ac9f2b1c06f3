//! `MasterState` (§2 row G): the single object that bundles the spec, the
//! registry, the KV store, the dependency scheduler, and the reconciler
//! for one running application, and implements the orchestration rules in
//! §4.F/§4.G on top of them.
//!
//! Deliberately holds no lock of its own spanning every component — each
//! collaborator (`ContainerRegistry`, `KvStore`) owns its own lock
//! domain, and `MasterState` only serializes the handful of fields that
//! are genuinely its own (the registered endpoint, the terminal
//! outcome).

// Layer 1: Standard library imports
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info};

// Layer 3: Internal module imports
use super::report::{ApplicationReport, ApplicationState};
use crate::cluster::{ClusterInterface, FinalStatus};
use crate::config::MasterConfig;
use crate::error::{Result, SkeinError};
use crate::kv::KvStore;
use crate::reconciler::Reconciler;
use crate::registry::{ContainerRecord, ContainerRegistry, ContainerState};
use crate::restart::{RestartDecision, RestartPolicy};
use crate::scheduler::DependencyScheduler;
use crate::spec::{ApplicationSpec, Resources, ServiceSpec};
use crate::util::{ApplicationId, ContainerId, ServiceName};

struct Endpoint {
    host: String,
    port: u16,
    tracking_url: String,
}

struct Outcome {
    final_status: FinalStatus,
    diagnostics: String,
    finish_time: chrono::DateTime<Utc>,
}

/// Owns one application's coordination state for the lifetime of the AM
/// process.
pub struct MasterState {
    id: ApplicationId,
    user: String,
    spec: Arc<ApplicationSpec>,
    registry: ContainerRegistry,
    kv: KvStore,
    scheduler: Arc<DependencyScheduler>,
    reconciler: Arc<Reconciler>,
    restart_policy: RestartPolicy,
    cluster: Arc<dyn ClusterInterface>,
    config: MasterConfig,
    start_time: chrono::DateTime<Utc>,
    endpoint: Mutex<Option<Endpoint>>,
    outcome: Mutex<Option<Outcome>>,
    shutting_down: AtomicBool,
}

impl MasterState {
    pub fn new(
        spec: ApplicationSpec,
        config: MasterConfig,
        cluster: Arc<dyn ClusterInterface>,
        appmaster_address: String,
        user: String,
    ) -> Self {
        let spec = Arc::new(spec);
        let registry = ContainerRegistry::new();
        let kv = KvStore::new();
        let scheduler = Arc::new(DependencyScheduler::new());

        for (name, service) in &spec.services {
            for _ in 0..service.instances {
                registry.request_instance(name);
            }
        }

        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&spec),
            registry.clone(),
            kv.clone(),
            Arc::clone(&cluster),
            config.clone(),
            appmaster_address,
        ));

        Self {
            id: ApplicationId::new(),
            user,
            spec,
            registry,
            kv,
            scheduler,
            reconciler,
            restart_policy: RestartPolicy::new(),
            cluster,
            config,
            start_time: Utc::now(),
            endpoint: Mutex::new(None),
            outcome: Mutex::new(None),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    /// Register with the cluster and submit every dependency-free
    /// service's initial WAITING instances.
    pub async fn bootstrap(&self, host: &str, port: u16, tracking_url: &str) -> Result<()> {
        self.cluster
            .register(host, port, tracking_url)
            .await
            .map_err(|err| SkeinError::Unavailable {
                operation: "register".to_string(),
                source: Box::new(err),
            })?;
        *self.endpoint.lock() = Some(Endpoint {
            host: host.to_string(),
            port,
            tracking_url: tracking_url.to_string(),
        });

        for name in self.spec.services.keys() {
            self.recheck_eligibility(name).await?;
        }
        Ok(())
    }

    /// Run the AM's event loop until a shutdown request (external or
    /// cluster-initiated) ends it.
    pub async fn run(&self) -> Result<()> {
        loop {
            if self.shutting_down.load(AtomicOrdering::Acquire) {
                return Ok(());
            }

            let events = self.cluster.poll_events().await;
            let shutdown_requested = events.shutdown_requested;

            let failures = self.reconciler.handle_events(events).await?;
            for failure in failures {
                self.handle_failed_service(&failure.service).await?;
                if self.shutting_down.load(AtomicOrdering::Acquire) {
                    return Ok(());
                }
            }

            if self.all_services_complete() {
                self.shutdown(FinalStatus::Succeeded, "all services completed".to_string())
                    .await?;
                return Ok(());
            }

            if shutdown_requested {
                self.shutdown(FinalStatus::Killed, "shutdown requested by cluster".to_string())
                    .await?;
                return Ok(());
            }
        }
    }

    /// Whether every service has reached "all instances SUCCEEDED" or has
    /// no remaining desired instances (§4.F application-success rule). A
    /// service with a lingering FAILED instance never reaches this state
    /// on its own: `handle_failed_service` either replaces it with a fresh
    /// non-terminal instance or exhausts the restart budget and shuts the
    /// application down with FAILED before this check runs.
    fn all_services_complete(&self) -> bool {
        self.spec.services.keys().all(|service| {
            self.registry
                .instances_of(service)
                .iter()
                .all(|record| record.state.is_terminal())
        })
    }

    async fn handle_failed_service(&self, service: &ServiceName) -> Result<()> {
        match self.restart_policy.record_failure_and_decide(&self.spec, service) {
            RestartDecision::Restart => {
                let instance = self.registry.request_instance(service);
                self.reconciler
                    .request_instances(service, &[instance])
                    .await
            }
            RestartDecision::ServiceExhausted => {
                error!(%service, "master: service exhausted its restart budget");
                self.shutdown(
                    FinalStatus::Failed,
                    format!("service '{service}' exceeded its restart budget"),
                )
                .await
            }
        }
    }

    /// Recompute launch eligibility for `service` and, on the
    /// blocked->eligible edge, hand every currently-WAITING instance to
    /// the reconciler.
    async fn recheck_eligibility(&self, service: &ServiceName) -> Result<()> {
        if !self.scheduler.recheck(&self.spec, &self.kv, service) {
            return Ok(());
        }
        let waiting: Vec<u32> = self
            .registry
            .instances_of(service)
            .into_iter()
            .filter(|record| record.state == ContainerState::Waiting)
            .map(|record| record.instance)
            .collect();
        if waiting.is_empty() {
            return Ok(());
        }
        self.reconciler.request_instances(service, &waiting).await
    }

    // -- KV surface (§4.B, plus §6 `keyvalueList`) --------------------------

    pub async fn kv_get(&self, key: &str, wait: bool) -> Result<String> {
        self.kv.get(key, wait).await
    }

    pub async fn kv_set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.kv.set(key.clone(), value);
        if let Ok(dependency) = ServiceName::new(key) {
            for dependent in DependencyScheduler::dependents_of(&self.spec, &dependency) {
                self.recheck_eligibility(&dependent.clone()).await?;
            }
        }
        Ok(())
    }

    pub fn kv_del(&self, key: &str) -> bool {
        self.kv.del(key)
    }

    pub fn kv_list(&self) -> std::collections::HashMap<String, String> {
        self.kv.get_all()
    }

    // -- Spec/container introspection (§6) ----------------------------------

    pub fn get_service(&self, name: &ServiceName) -> Option<ServiceSpec> {
        self.spec.service(name).cloned()
    }

    pub fn get_application_spec(&self) -> Arc<ApplicationSpec> {
        Arc::clone(&self.spec)
    }

    pub fn get_containers(
        &self,
        states: Option<&[ContainerState]>,
        services: Option<&[ServiceName]>,
    ) -> Vec<ContainerRecord> {
        self.registry.get_containers(states, services)
    }

    // -- Lifecycle control (§6 `killContainer`, `scale`, `shutdown`) --------

    pub async fn kill_container(&self, service: &ServiceName, instance: u32) -> Result<()> {
        let records = self.registry.instances_of(service);
        let record = records
            .get(instance as usize)
            .ok_or_else(|| SkeinError::NotFound {
                message: format!("instance {instance} of service '{service}' not found"),
            })?;
        self.kill_instance(service, instance, record.yarn_container_id.clone())
            .await
    }

    /// Scale `service` to `desired` instances. Scaling up creates new
    /// WAITING instances (requested immediately if the service is already
    /// eligible); scaling down kills the highest-indexed non-terminal
    /// instances first, with WAITING instances dropped without any
    /// cluster round trip (§4.G).
    pub async fn scale(&self, service: &ServiceName, desired: u32) -> Result<()> {
        if !self.spec.services.contains_key(service) {
            return Err(SkeinError::unknown_service(service));
        }

        let mut current = self.registry.instances_of(service);
        current.retain(|record| !record.state.is_terminal());
        let current_count = current.len() as u32;

        match desired.cmp(&current_count) {
            Ordering::Greater => {
                let to_add = desired - current_count;
                let mut new_indices = Vec::with_capacity(to_add as usize);
                for _ in 0..to_add {
                    new_indices.push(self.registry.request_instance(service));
                }
                if self.scheduler.is_marked_eligible(service) {
                    self.reconciler.request_instances(service, &new_indices).await?;
                }
            }
            Ordering::Less => {
                let to_remove = current_count - desired;
                current.sort_by(|a, b| b.instance.cmp(&a.instance));
                for record in current.into_iter().take(to_remove as usize) {
                    self.kill_instance(service, record.instance, record.yarn_container_id.clone())
                        .await?;
                }
            }
            Ordering::Equal => {}
        }
        Ok(())
    }

    async fn kill_instance(
        &self,
        service: &ServiceName,
        instance: u32,
        container_id: Option<ContainerId>,
    ) -> Result<()> {
        let was_running = self.registry.kill(service, instance)?;
        if was_running {
            if let Some(container_id) = container_id {
                self.reconciler.stop_instance(&container_id).await?;
            }
        }
        Ok(())
    }

    /// Idempotent: only the first call has effect. Kills every
    /// non-terminal container, waits the configured grace period, then
    /// unregisters with the cluster (§4.F).
    pub async fn shutdown(&self, final_status: FinalStatus, diagnostics: String) -> Result<()> {
        if self
            .shutting_down
            .compare_exchange(
                false,
                true,
                AtomicOrdering::AcqRel,
                AtomicOrdering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }

        info!(?final_status, %diagnostics, "master: shutting down");

        let running = self
            .registry
            .get_containers(Some(&[ContainerState::Running, ContainerState::Requested]), None);
        for record in running {
            let service = ServiceName::new(record.service.clone()).map_err(|_| {
                SkeinError::Internal {
                    message: "container record carries an invalid service name".to_string(),
                }
            })?;
            self.kill_instance(&service, record.instance, record.yarn_container_id.clone())
                .await?;
        }

        tokio::time::sleep(self.config.shutdown_grace).await;

        self.cluster
            .unregister(final_status, &diagnostics)
            .await
            .map_err(|err| SkeinError::Unavailable {
                operation: "unregister".to_string(),
                source: Box::new(err),
            })?;

        *self.outcome.lock() = Some(Outcome {
            final_status,
            diagnostics,
            finish_time: Utc::now(),
        });
        Ok(())
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(AtomicOrdering::Acquire)
    }

    /// Assemble the current status snapshot (§6 `getStatus`).
    pub fn report(&self) -> ApplicationReport {
        let endpoint = self.endpoint.lock();
        let outcome = self.outcome.lock();

        let (state, final_status, diagnostics, finish_time) = match &*outcome {
            Some(outcome) => (
                ApplicationState::Finished,
                outcome.final_status,
                Some(outcome.diagnostics.clone()),
                Some(outcome.finish_time),
            ),
            None => (ApplicationState::Running, FinalStatus::Undefined, None, None),
        };

        let total = self.spec.total_initial_instances().max(1);
        let mut started = 0u64;
        let mut usage = Resources {
            memory_mib: 0,
            vcores: 0,
        };
        for (name, service_spec) in &self.spec.services {
            for record in self.registry.instances_of(name) {
                if record.state == ContainerState::Running || record.state.is_terminal() {
                    started += 1;
                }
                if record.state == ContainerState::Running {
                    usage.memory_mib += service_spec.resources.memory_mib;
                    usage.vcores += service_spec.resources.vcores;
                }
            }
        }

        ApplicationReport {
            id: self.id,
            name: self.spec.name.clone(),
            user: self.user.clone(),
            queue: self.spec.queue.clone(),
            tags: self.spec.tags.iter().cloned().collect::<BTreeSet<_>>(),
            host: endpoint.as_ref().map(|e| e.host.clone()),
            port: endpoint.as_ref().map(|e| e.port),
            tracking_url: endpoint.as_ref().map(|e| e.tracking_url.clone()),
            state,
            final_status,
            progress: (started as f64 / total as f64).min(1.0),
            usage,
            diagnostics,
            start_time: self.start_time,
            finish_time,
        }
    }
}
