//! Restart and failure policy (§4.F).
//!
//! A service's restart budget (`max_restarts`) is shared across all of its
//! instances, not tracked per instance: any instance of a service failing
//! draws down the same counter. `SUCCEEDED` and `KILLED` completions never
//! consume budget or trigger a restart decision at all — only `FAILED`
//! does.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use crate::spec::ApplicationSpec;
use crate::util::ServiceName;

/// Outcome of consulting the restart policy after a `FAILED` completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Budget remains; the reconciler should request a replacement
    /// instance.
    Restart,
    /// The service's restart budget is exhausted; the caller must mark
    /// the service (and, per §4.F, the whole application) as failed.
    ServiceExhausted,
}

/// Tracks cumulative FAILED-completion counts per service and decides
/// whether a replacement instance may still be requested.
#[derive(Default)]
pub struct RestartPolicy {
    failures: DashMap<ServiceName, i64>,
}

impl RestartPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count of FAILED completions charged against `service`'s
    /// budget so far.
    pub fn failure_count(&self, service: &ServiceName) -> i64 {
        self.failures.get(service).map(|v| *v).unwrap_or(0)
    }

    /// Record one FAILED completion for `service` and decide whether a
    /// restart is still permitted.
    ///
    /// `max_restarts == -1` (per [`crate::spec::ServiceSpec::unlimited_restarts`])
    /// restarts forever without consuming budget. Otherwise the count is
    /// charged first and compared to the budget: a service with
    /// `max_restarts == 0` permits zero restarts (the first failure
    /// already exhausts it).
    pub fn record_failure_and_decide(
        &self,
        spec: &ApplicationSpec,
        service: &ServiceName,
    ) -> RestartDecision {
        let Some(service_spec) = spec.service(service) else {
            return RestartDecision::ServiceExhausted;
        };
        if service_spec.unlimited_restarts() {
            return RestartDecision::Restart;
        }

        let mut count = self.failures.entry(service.clone()).or_insert(0);
        *count += 1;
        if *count > service_spec.max_restarts {
            RestartDecision::ServiceExhausted
        } else {
            RestartDecision::Restart
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{build_services, ApplicationSpec, Resources, ServiceSpec};
    use std::collections::{BTreeMap, BTreeSet};

    fn spec_with(max_restarts: i64) -> ApplicationSpec {
        let service = ServiceSpec {
            instances: 1,
            max_restarts,
            resources: Resources {
                memory_mib: 128,
                vcores: 1,
            },
            files: BTreeMap::new(),
            env: BTreeMap::new(),
            commands: vec!["true".into()],
            depends: vec![],
        };
        ApplicationSpec {
            name: "app".into(),
            queue: "default".into(),
            max_attempts: 1,
            tags: BTreeSet::new(),
            services: build_services(vec![("a".into(), service)]).expect("valid"),
        }
    }

    #[test]
    fn zero_budget_exhausts_on_first_failure() {
        let spec = spec_with(0);
        let policy = RestartPolicy::new();
        let a = ServiceName::new("a").expect("valid");
        assert_eq!(
            policy.record_failure_and_decide(&spec, &a),
            RestartDecision::ServiceExhausted
        );
    }

    #[test]
    fn budget_of_two_permits_two_restarts_then_exhausts() {
        let spec = spec_with(2);
        let policy = RestartPolicy::new();
        let a = ServiceName::new("a").expect("valid");
        assert_eq!(
            policy.record_failure_and_decide(&spec, &a),
            RestartDecision::Restart
        );
        assert_eq!(
            policy.record_failure_and_decide(&spec, &a),
            RestartDecision::Restart
        );
        assert_eq!(
            policy.record_failure_and_decide(&spec, &a),
            RestartDecision::ServiceExhausted
        );
    }

    #[test]
    fn unlimited_restarts_never_exhausts() {
        let spec = spec_with(-1);
        let policy = RestartPolicy::new();
        let a = ServiceName::new("a").expect("valid");
        for _ in 0..1000 {
            assert_eq!(
                policy.record_failure_and_decide(&spec, &a),
                RestartDecision::Restart
            );
        }
        assert_eq!(policy.failure_count(&a), 0);
    }

    #[test]
    fn unknown_service_is_exhausted() {
        let spec = spec_with(5);
        let policy = RestartPolicy::new();
        let unknown = ServiceName::new("ghost").expect("valid");
        assert_eq!(
            policy.record_failure_and_decide(&spec, &unknown),
            RestartDecision::ServiceExhausted
        );
    }
}
