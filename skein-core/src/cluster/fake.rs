//! In-memory cluster interface fake for deterministic tests (§9 design
//! note: "Tests use an in-memory fake that replays canned allocation/
//! completion sequences deterministically").
//!
//! By default every `request_containers` call is granted immediately
//! (`auto_grant = true`), which is enough to drive the end-to-end
//! scenarios in spec.md §8. Tests that need to control allocation timing
//! precisely can disable auto-grant and call [`FakeCluster::grant`]
//! explicitly.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::traits::{
    Allocated, ClusterError, ClusterEvents, ClusterInterface, Completed, FinalStatus,
    LaunchContext, ResourceRequest,
};
use crate::util::ContainerId;

struct FakeInner {
    next_container_seq: u64,
    auto_grant: bool,
    pending_requests: VecDeque<ResourceRequest>,
    allocated_queue: VecDeque<Allocated>,
    completed_queue: VecDeque<Completed>,
    shutdown_requested: bool,
    registered: Option<(String, u16, String)>,
    unregistered: Option<(FinalStatus, String)>,
    launched: Vec<(ContainerId, LaunchContext)>,
    released: Vec<ContainerId>,
    stopped: Vec<ContainerId>,
}

/// In-memory, clonable [`ClusterInterface`] test double.
#[derive(Clone)]
pub struct FakeCluster {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeCluster {
    pub fn new(auto_grant: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeInner {
                next_container_seq: 1,
                auto_grant,
                pending_requests: VecDeque::new(),
                allocated_queue: VecDeque::new(),
                completed_queue: VecDeque::new(),
                shutdown_requested: false,
                registered: None,
                unregistered: None,
                launched: Vec::new(),
                released: Vec::new(),
                stopped: Vec::new(),
            })),
        }
    }

    /// Grant the oldest pending request deterministically, returning the
    /// container id assigned.
    pub fn grant(&self) -> Option<ContainerId> {
        let mut inner = self.inner.lock();
        let request = inner.pending_requests.pop_front()?;
        let seq = inner.next_container_seq;
        inner.next_container_seq += 1;
        let container_id = ContainerId::new(format!("container_fake_{seq:06}"));
        inner.allocated_queue.push_back(Allocated {
            container_id: container_id.clone(),
            resources: request.resources,
        });
        Some(container_id)
    }

    /// Queue a completion event for a container already launched.
    pub fn complete(&self, container_id: ContainerId, exit_status: i32, preempted: bool) {
        let mut inner = self.inner.lock();
        inner.completed_queue.push_back(Completed {
            container_id,
            exit_status,
            preempted,
            diagnostics: if exit_status == 0 {
                String::new()
            } else {
                format!("exited with status {exit_status}")
            },
        });
    }

    /// Queue a cluster-initiated shutdown request.
    pub fn request_shutdown(&self) {
        self.inner.lock().shutdown_requested = true;
    }

    pub fn registered_endpoint(&self) -> Option<(String, u16, String)> {
        self.inner.lock().registered.clone()
    }

    pub fn unregistered_status(&self) -> Option<(FinalStatus, String)> {
        self.inner.lock().unregistered.clone()
    }

    pub fn launched_containers(&self) -> Vec<ContainerId> {
        self.inner
            .lock()
            .launched
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn stopped_containers(&self) -> Vec<ContainerId> {
        self.inner.lock().stopped.clone()
    }
}

#[async_trait]
impl ClusterInterface for FakeCluster {
    async fn register(
        &self,
        host: &str,
        port: u16,
        tracking_url: &str,
    ) -> Result<(), ClusterError> {
        self.inner.lock().registered = Some((host.to_string(), port, tracking_url.to_string()));
        Ok(())
    }

    async fn unregister(
        &self,
        final_status: FinalStatus,
        diagnostics: &str,
    ) -> Result<(), ClusterError> {
        self.inner.lock().unregistered = Some((final_status, diagnostics.to_string()));
        Ok(())
    }

    async fn request_containers(
        &self,
        requests: Vec<ResourceRequest>,
    ) -> Result<(), ClusterError> {
        let auto_grant = {
            let mut inner = self.inner.lock();
            inner.pending_requests.extend(requests);
            inner.auto_grant
        };
        if auto_grant {
            while self.grant().is_some() {}
        }
        Ok(())
    }

    async fn release_container(&self, container_id: &ContainerId) -> Result<(), ClusterError> {
        self.inner.lock().released.push(container_id.clone());
        Ok(())
    }

    async fn launch_container(
        &self,
        container_id: &ContainerId,
        context: LaunchContext,
    ) -> Result<(), ClusterError> {
        self.inner
            .lock()
            .launched
            .push((container_id.clone(), context));
        Ok(())
    }

    async fn stop_container(&self, container_id: &ContainerId) -> Result<(), ClusterError> {
        self.inner.lock().stopped.push(container_id.clone());
        Ok(())
    }

    async fn poll_events(&self) -> ClusterEvents {
        let mut inner = self.inner.lock();
        let events = ClusterEvents {
            allocated: inner.allocated_queue.drain(..).collect(),
            completed: inner.completed_queue.drain(..).collect(),
            shutdown_requested: std::mem::take(&mut inner.shutdown_requested),
        };
        if events.allocated.is_empty() && events.completed.is_empty() && !events.shutdown_requested
        {
            drop(inner);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Resources;

    #[tokio::test]
    async fn auto_grant_allocates_immediately() {
        let cluster = FakeCluster::new(true);
        cluster
            .request_containers(vec![ResourceRequest {
                service: "a".into(),
                instance: 0,
                resources: Resources {
                    memory_mib: 128,
                    vcores: 1,
                },
            }])
            .await
            .unwrap();

        let events = cluster.poll_events().await;
        assert_eq!(events.allocated.len(), 1);
    }

    #[tokio::test]
    async fn manual_grant_requires_explicit_call() {
        let cluster = FakeCluster::new(false);
        cluster
            .request_containers(vec![ResourceRequest {
                service: "a".into(),
                instance: 0,
                resources: Resources {
                    memory_mib: 128,
                    vcores: 1,
                },
            }])
            .await
            .unwrap();

        let events = cluster.poll_events().await;
        assert!(events.allocated.is_empty());

        let id = cluster.grant().unwrap();
        let events = cluster.poll_events().await;
        assert_eq!(events.allocated[0].container_id, id);
    }
}
