//! The YARN reconciler (§4.E): turns WAITING instances into running
//! containers and running containers into registry completions, talking
//! to the cluster only through [`crate::cluster::ClusterInterface`].
//!
//! YARN does not echo back which request an allocation answers, so grants
//! are matched to pending requests by resource shape in arrival order
//! (FIFO per `(memory_mib, vcores)` pair), not by any request identifier.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tracing::warn;

// Layer 3: Internal module imports
use crate::cluster::{
    Allocated, ClusterError, ClusterEvents, ClusterInterface, Completed, LaunchContext,
    ResourceRequest,
};
use crate::config::MasterConfig;
use crate::error::{Result, SkeinError};
use crate::kv::KvStore;
use crate::registry::{CompletionOutcome, ContainerRegistry};
use crate::spec::{ApplicationSpec, Resources, ServiceSpec};
use crate::util::{ContainerId, ServiceName};

/// A `FAILED` completion, surfaced to the caller (`master::state`) so it
/// can consult the restart policy and, if budget remains, request a
/// replacement instance.
#[derive(Debug, Clone)]
pub struct FailedCompletion {
    pub service: ServiceName,
}

type ResourceShape = (u32, u32);

fn shape_of(resources: Resources) -> ResourceShape {
    (resources.memory_mib, resources.vcores)
}

/// Drives container lifecycle transitions against a [`ClusterInterface`].
///
/// Holds no lock of its own beyond the pending-request queue: the
/// registry and KV store are independently lock-owning handles, cloned in
/// at construction (§5: no single coarse-grained lock spans every
/// component).
pub struct Reconciler {
    spec: Arc<ApplicationSpec>,
    registry: ContainerRegistry,
    #[allow(dead_code)]
    kv: KvStore,
    cluster: Arc<dyn ClusterInterface>,
    config: MasterConfig,
    appmaster_address: String,
    pending: Mutex<HashMap<ResourceShape, VecDeque<(ServiceName, u32)>>>,
}

impl Reconciler {
    pub fn new(
        spec: Arc<ApplicationSpec>,
        registry: ContainerRegistry,
        kv: KvStore,
        cluster: Arc<dyn ClusterInterface>,
        config: MasterConfig,
        appmaster_address: String,
    ) -> Self {
        Self {
            spec,
            registry,
            kv,
            cluster,
            config,
            appmaster_address,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Move a batch of WAITING instances to REQUESTED and ask the cluster
    /// for matching resources.
    pub async fn request_instances(&self, service: &ServiceName, instances: &[u32]) -> Result<()> {
        let service_spec = self
            .spec
            .service(service)
            .ok_or_else(|| SkeinError::unknown_service(service))?;

        let mut requests = Vec::with_capacity(instances.len());
        for &instance in instances {
            self.registry.mark_requested(service, instance)?;
            requests.push(ResourceRequest {
                service: service.to_string(),
                instance,
                resources: service_spec.resources,
            });
        }

        {
            let mut pending = self.pending.lock();
            let queue = pending.entry(shape_of(service_spec.resources)).or_default();
            queue.extend(instances.iter().map(|&instance| (service.clone(), instance)));
        }

        let cluster = Arc::clone(&self.cluster);
        self.call_with_retry("request_containers", move || {
            let cluster = Arc::clone(&cluster);
            let requests = requests.clone();
            async move { cluster.request_containers(requests).await }
        })
        .await
    }

    /// Process one batch of events observed from the cluster, launching
    /// newly allocated containers and recording completions. Returns the
    /// `FAILED` completions the caller should run through the restart
    /// policy.
    pub async fn handle_events(&self, events: ClusterEvents) -> Result<Vec<FailedCompletion>> {
        for allocated in events.allocated {
            self.handle_allocated(allocated).await?;
        }

        let mut failures = Vec::new();
        for completed in events.completed {
            if let Some(failure) = self.handle_completed(completed).await? {
                failures.push(failure);
            }
        }
        Ok(failures)
    }

    async fn handle_allocated(&self, allocated: Allocated) -> Result<()> {
        let matched = {
            let mut pending = self.pending.lock();
            pending
                .get_mut(&shape_of(allocated.resources))
                .and_then(VecDeque::pop_front)
        };
        let Some((service, instance)) = matched else {
            warn!(
                container_id = %allocated.container_id,
                "reconciler: allocation with no matching pending request"
            );
            return Ok(());
        };

        self.registry
            .bind_allocation(&service, instance, allocated.container_id.clone())?;

        let service_spec = self
            .spec
            .service(&service)
            .ok_or_else(|| SkeinError::unknown_service(&service))?;
        let context = self.build_launch_context(&service, instance, service_spec, &allocated.container_id);

        let cluster = Arc::clone(&self.cluster);
        let container_id = allocated.container_id.clone();
        self.call_with_retry("launch_container", move || {
            let cluster = Arc::clone(&cluster);
            let container_id = container_id.clone();
            let context = context.clone();
            async move { cluster.launch_container(&container_id, context).await }
        })
        .await?;

        self.registry.on_launched(&service, instance)
    }

    fn build_launch_context(
        &self,
        service: &ServiceName,
        instance: u32,
        service_spec: &ServiceSpec,
        container_id: &ContainerId,
    ) -> LaunchContext {
        let mut env = service_spec.env.clone();
        env.insert(
            "SKEIN_APPMASTER_ADDRESS".to_string(),
            self.appmaster_address.clone(),
        );
        env.insert("SKEIN_CONTAINER_ID".to_string(), container_id.to_string());
        env.insert("SKEIN_SERVICE".to_string(), service.to_string());
        env.insert("SKEIN_INSTANCE".to_string(), instance.to_string());

        LaunchContext {
            files: service_spec.files.clone(),
            env,
            commands: service_spec.commands.clone(),
        }
    }

    async fn handle_completed(&self, completed: Completed) -> Result<Option<FailedCompletion>> {
        let Some((service, instance)) = self.registry.resolve(&completed.container_id) else {
            warn!(
                container_id = %completed.container_id,
                "reconciler: completion for an unknown container id"
            );
            return Ok(None);
        };

        let outcome = if completed.preempted {
            CompletionOutcome::Killed
        } else if completed.exit_status == 0 {
            CompletionOutcome::Succeeded
        } else {
            CompletionOutcome::Failed
        };
        let diagnostics = (!completed.diagnostics.is_empty()).then_some(completed.diagnostics);

        self.registry
            .on_completed(&service, instance, outcome, diagnostics)?;

        Ok(matches!(outcome, CompletionOutcome::Failed).then_some(FailedCompletion { service }))
    }

    /// Stop a running container, used by scale-down and shutdown to give
    /// back containers that already have a bound allocation.
    pub async fn stop_instance(&self, container_id: &ContainerId) -> Result<()> {
        let cluster = Arc::clone(&self.cluster);
        let container_id = container_id.clone();
        self.call_with_retry("stop_container", move || {
            let cluster = Arc::clone(&cluster);
            let container_id = container_id.clone();
            async move { cluster.stop_container(&container_id).await }
        })
        .await
    }

    /// Retry a cluster-interface call with exponential backoff, giving up
    /// with [`SkeinError::Unavailable`] once `max_cluster_retries` is
    /// exceeded (§7 persistent-failure termination).
    async fn call_with_retry<F, Fut>(&self, operation: &str, mut f: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<(), ClusterError>>,
    {
        let mut attempt = 0u32;
        let mut delay = self.config.retry_base_delay;
        loop {
            match f().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.config.max_cluster_retries {
                        return Err(SkeinError::Unavailable {
                            operation: operation.to_string(),
                            source: Box::new(err),
                        });
                    }
                    warn!(operation, attempt, %err, "reconciler: cluster call failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.config.retry_max_delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::FakeCluster;
    use crate::spec::{build_services, Resources};
    use std::collections::{BTreeMap, BTreeSet};

    fn single_service_spec() -> Arc<ApplicationSpec> {
        let service = ServiceSpec {
            instances: 1,
            max_restarts: 1,
            resources: Resources {
                memory_mib: 128,
                vcores: 1,
            },
            files: BTreeMap::new(),
            env: BTreeMap::new(),
            commands: vec!["true".into()],
            depends: vec![],
        };
        Arc::new(ApplicationSpec {
            name: "app".into(),
            queue: "default".into(),
            max_attempts: 1,
            tags: BTreeSet::new(),
            services: build_services(vec![("worker".into(), service)]).expect("valid"),
        })
    }

    #[tokio::test]
    async fn allocation_is_matched_and_launched() {
        let spec = single_service_spec();
        let registry = ContainerRegistry::new();
        let kv = KvStore::new();
        let cluster = Arc::new(FakeCluster::new(true));
        let worker = ServiceName::new("worker").expect("valid");
        let instance = registry.request_instance(&worker);

        let reconciler = Reconciler::new(
            Arc::clone(&spec),
            registry.clone(),
            kv,
            cluster.clone() as Arc<dyn ClusterInterface>,
            MasterConfig::default(),
            "127.0.0.1:1234".into(),
        );

        reconciler
            .request_instances(&worker, &[instance])
            .await
            .unwrap();

        let events = cluster.poll_events().await;
        let failures = reconciler.handle_events(events).await.unwrap();
        assert!(failures.is_empty());

        let records = registry.instances_of(&worker);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].state,
            crate::registry::ContainerState::Running
        );

        let launched = cluster.launched_containers();
        assert_eq!(launched.len(), 1);
    }

    #[tokio::test]
    async fn failed_completion_is_reported() {
        let spec = single_service_spec();
        let registry = ContainerRegistry::new();
        let kv = KvStore::new();
        let cluster = Arc::new(FakeCluster::new(true));
        let worker = ServiceName::new("worker").expect("valid");
        let instance = registry.request_instance(&worker);

        let reconciler = Reconciler::new(
            Arc::clone(&spec),
            registry.clone(),
            kv,
            cluster.clone() as Arc<dyn ClusterInterface>,
            MasterConfig::default(),
            "127.0.0.1:1234".into(),
        );

        reconciler
            .request_instances(&worker, &[instance])
            .await
            .unwrap();
        let events = cluster.poll_events().await;
        reconciler.handle_events(events).await.unwrap();

        let container_id = cluster.launched_containers().remove(0);
        cluster.complete(container_id, 1, false);
        let events = cluster.poll_events().await;
        let failures = reconciler.handle_events(events).await.unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].service, worker);
        assert_eq!(
            registry.instances_of(&worker)[0].state,
            crate::registry::ContainerState::Failed
        );
    }
}
