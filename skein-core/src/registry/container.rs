//! The authoritative per-service container table (§4.C).
//!
//! Mutated only under its internal lock; every query method copies its
//! result out before returning, so callers never observe a reference into
//! state that could change under them mid-read (§5: "snapshots for
//! queries are copied out before being returned").

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};

// Layer 3: Internal module imports
use super::types::{ContainerRecord, ContainerState};
use crate::error::{Result, SkeinError};
use crate::util::{ContainerId, ServiceName};

/// Why a container reached a terminal state, classified per §6
/// ("Completion classification").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Succeeded,
    Failed,
    Killed,
}

impl CompletionOutcome {
    fn target_state(self) -> ContainerState {
        match self {
            Self::Succeeded => ContainerState::Succeeded,
            Self::Failed => ContainerState::Failed,
            Self::Killed => ContainerState::Killed,
        }
    }
}

struct RegistryInner {
    containers: HashMap<ServiceName, Vec<ContainerRecord>>,
    by_container_id: HashMap<ContainerId, (ServiceName, u32)>,
}

/// The container registry (§2 row C, §4.C).
#[derive(Clone)]
pub struct ContainerRegistry {
    inner: std::sync::Arc<Mutex<RegistryInner>>,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(RegistryInner {
                containers: HashMap::new(),
                by_container_id: HashMap::new(),
            })),
        }
    }

    /// Create a new WAITING record for `service` and return its instance
    /// index. Indices are handed out monotonically and never reused
    /// (§3, §5 "Ordering guarantees").
    pub fn request_instance(&self, service: &ServiceName) -> u32 {
        let mut inner = self.inner.lock();
        let records = inner.containers.entry(service.clone()).or_default();
        let instance = records.len() as u32;
        records.push(ContainerRecord::new(service.as_str(), instance));
        info!(%service, instance, "registry: new WAITING instance");
        instance
    }

    /// `WAITING -> REQUESTED`: an allocation request has been issued for
    /// this instance.
    pub fn mark_requested(&self, service: &ServiceName, instance: u32) -> Result<()> {
        self.transition(service, instance, ContainerState::Requested, |_| {})
    }

    /// Bind a granted cluster allocation to a REQUESTED instance.
    pub fn bind_allocation(
        &self,
        service: &ServiceName,
        instance: u32,
        container_id: ContainerId,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .by_container_id
            .insert(container_id.clone(), (service.clone(), instance));
        drop(inner);
        self.with_record(service, instance, |record| {
            record.yarn_container_id = Some(container_id);
        })
    }

    /// `REQUESTED -> RUNNING`: the cluster acknowledged the launch.
    pub fn on_launched(&self, service: &ServiceName, instance: u32) -> Result<()> {
        self.transition(service, instance, ContainerState::Running, |record| {
            record.start_time = Some(Utc::now());
        })
    }

    /// Route a completion event to its terminal state. A no-op (logged,
    /// not an error) if the instance is already terminal — completion
    /// events targeting an already-terminal instance must not be coerced
    /// (§4.C, §9).
    pub fn on_completed(
        &self,
        service: &ServiceName,
        instance: u32,
        outcome: CompletionOutcome,
        diagnostics: Option<String>,
    ) -> Result<()> {
        let target = outcome.target_state();
        let mut inner = self.inner.lock();
        let Some(records) = inner.containers.get_mut(service) else {
            return Err(SkeinError::unknown_service(service));
        };
        let Some(record) = records.get_mut(instance as usize) else {
            return Err(SkeinError::NotFound {
                message: format!("instance {instance} of service '{service}' not found"),
            });
        };
        if record.state.is_terminal() {
            warn!(%service, instance, ?record.state, "registry: completion event on terminal instance ignored");
            return Ok(());
        }
        if !record.state.can_transition_to(target) {
            return Err(SkeinError::Internal {
                message: format!(
                    "illegal transition for {service}/{instance}: {:?} -> {:?}",
                    record.state, target
                ),
            });
        }
        record.state = target;
        record.finish_time = Some(Utc::now());
        record.diagnostics = diagnostics;
        info!(%service, instance, ?target, "registry: container completed");
        Ok(())
    }

    /// Transition any non-terminal instance to KILLED. Idempotent: a
    /// no-op on an already-terminal instance (§8 round-trip law).
    pub fn kill(&self, service: &ServiceName, instance: u32) -> Result<bool> {
        let mut inner = self.inner.lock();
        let Some(records) = inner.containers.get_mut(service) else {
            return Err(SkeinError::unknown_service(service));
        };
        let Some(record) = records.get_mut(instance as usize) else {
            return Err(SkeinError::NotFound {
                message: format!("instance {instance} of service '{service}' not found"),
            });
        };
        if record.state.is_terminal() {
            return Ok(false);
        }
        record.state = ContainerState::Killed;
        record.finish_time = Some(Utc::now());
        Ok(true)
    }

    /// Resolve a cluster-assigned container id back to `(service,
    /// instance)`.
    pub fn resolve(&self, container_id: &ContainerId) -> Option<(ServiceName, u32)> {
        self.inner.lock().by_container_id.get(container_id).cloned()
    }

    /// Snapshot of every instance currently recorded for `service`.
    pub fn instances_of(&self, service: &ServiceName) -> Vec<ContainerRecord> {
        self.inner
            .lock()
            .containers
            .get(service)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of non-terminal instances for `service` (§8 invariant: this
    /// never exceeds `desired_instances` except during the atomic window
    /// of a scale-down).
    pub fn non_terminal_count(&self, service: &ServiceName) -> u32 {
        self.inner
            .lock()
            .containers
            .get(service)
            .map(|records| records.iter().filter(|r| !r.state.is_terminal()).count() as u32)
            .unwrap_or(0)
    }

    /// Filtered, copied snapshot across every tracked service.
    pub fn get_containers(
        &self,
        states: Option<&[ContainerState]>,
        services: Option<&[ServiceName]>,
    ) -> Vec<ContainerRecord> {
        let inner = self.inner.lock();
        inner
            .containers
            .iter()
            .filter(|(name, _)| services.is_none_or(|s| s.contains(name)))
            .flat_map(|(_, records)| records.iter().cloned())
            .filter(|record| states.is_none_or(|s| s.contains(&record.state)))
            .collect()
    }

    fn transition(
        &self,
        service: &ServiceName,
        instance: u32,
        target: ContainerState,
        mutate: impl FnOnce(&mut ContainerRecord),
    ) -> Result<()> {
        self.with_record(service, instance, |record| {
            // caller-provided `mutate` runs regardless; the state write
            // below is the actual transition guard.
            mutate(record);
        })?;
        let mut inner = self.inner.lock();
        let records = inner
            .containers
            .get_mut(service)
            .ok_or_else(|| SkeinError::unknown_service(service))?;
        let record = records
            .get_mut(instance as usize)
            .ok_or_else(|| SkeinError::NotFound {
                message: format!("instance {instance} of service '{service}' not found"),
            })?;
        if !record.state.can_transition_to(target) {
            return Err(SkeinError::Internal {
                message: format!(
                    "illegal transition for {service}/{instance}: {:?} -> {target:?}",
                    record.state
                ),
            });
        }
        record.state = target;
        Ok(())
    }

    fn with_record(
        &self,
        service: &ServiceName,
        instance: u32,
        f: impl FnOnce(&mut ContainerRecord),
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let records = inner
            .containers
            .get_mut(service)
            .ok_or_else(|| SkeinError::unknown_service(service))?;
        let record = records
            .get_mut(instance as usize)
            .ok_or_else(|| SkeinError::NotFound {
                message: format!("instance {instance} of service '{service}' not found"),
            })?;
        f(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(name: &str) -> ServiceName {
        ServiceName::new(name).expect("valid")
    }

    #[test]
    fn lifecycle_happy_path() {
        let registry = ContainerRegistry::new();
        let service = svc("a");
        let instance = registry.request_instance(&service);
        assert_eq!(instance, 0);

        registry.mark_requested(&service, instance).unwrap();
        registry
            .bind_allocation(&service, instance, ContainerId::new("c1"))
            .unwrap();
        registry.on_launched(&service, instance).unwrap();
        registry
            .on_completed(&service, instance, CompletionOutcome::Succeeded, None)
            .unwrap();

        let records = registry.instances_of(&service);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, ContainerState::Succeeded);
        assert!(records[0].finish_time.is_some());
    }

    #[test]
    fn instance_indices_increase_monotonically_across_restarts() {
        let registry = ContainerRegistry::new();
        let service = svc("w");
        let first = registry.request_instance(&service);
        let second = registry.request_instance(&service);
        assert_eq!((first, second), (0, 1));
    }

    #[test]
    fn completion_on_terminal_instance_is_a_noop() {
        let registry = ContainerRegistry::new();
        let service = svc("a");
        let instance = registry.request_instance(&service);
        registry.mark_requested(&service, instance).unwrap();
        registry.on_launched(&service, instance).unwrap();
        registry
            .on_completed(&service, instance, CompletionOutcome::Succeeded, None)
            .unwrap();

        // Second completion event targeting the same, now-terminal instance.
        let result = registry.on_completed(&service, instance, CompletionOutcome::Failed, None);
        assert!(result.is_ok());
        assert_eq!(
            registry.instances_of(&service)[0].state,
            ContainerState::Succeeded
        );
    }

    #[test]
    fn kill_is_idempotent_on_terminal_instance() {
        let registry = ContainerRegistry::new();
        let service = svc("a");
        let instance = registry.request_instance(&service);
        registry.mark_requested(&service, instance).unwrap();
        registry.on_launched(&service, instance).unwrap();
        registry
            .on_completed(&service, instance, CompletionOutcome::Succeeded, None)
            .unwrap();

        assert!(!registry.kill(&service, instance).unwrap());
    }

    #[test]
    fn kill_transitions_running_instance() {
        let registry = ContainerRegistry::new();
        let service = svc("a");
        let instance = registry.request_instance(&service);
        registry.mark_requested(&service, instance).unwrap();
        registry.on_launched(&service, instance).unwrap();

        assert!(registry.kill(&service, instance).unwrap());
        assert_eq!(
            registry.instances_of(&service)[0].state,
            ContainerState::Killed
        );
    }

    #[test]
    fn non_terminal_count_excludes_terminal_instances() {
        let registry = ContainerRegistry::new();
        let service = svc("a");
        let i0 = registry.request_instance(&service);
        let i1 = registry.request_instance(&service);
        registry.mark_requested(&service, i0).unwrap();
        registry.on_launched(&service, i0).unwrap();
        registry
            .on_completed(&service, i0, CompletionOutcome::Succeeded, None)
            .unwrap();

        assert_eq!(registry.non_terminal_count(&service), 1);
        let _ = i1;
    }

    #[test]
    fn get_containers_filters_by_state_and_service() {
        let registry = ContainerRegistry::new();
        let a = svc("a");
        let b = svc("b");
        registry.request_instance(&a);
        registry.request_instance(&b);

        let only_a = registry.get_containers(None, Some(&[a.clone()]));
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].service, "a");

        let waiting = registry.get_containers(Some(&[ContainerState::Waiting]), None);
        assert_eq!(waiting.len(), 2);
    }
}
