//! Dependency scheduler (§4.D): decides when a service becomes
//! launch-eligible.
//!
//! Eligibility is *derived* from the key-value store — there is no second
//! source of truth for "is D ready" beyond the literal key `D` being set
//! (§9 design note). The only state this module keeps is a memoized edge
//! detector so that the "hand off every currently-WAITING instance"
//! side effect fires exactly once per service, on the blocked->eligible
//! transition, rather than every time eligibility happens to be
//! rechecked.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use dashmap::DashSet;

// Layer 3: Internal module imports
use crate::kv::KvStore;
use crate::spec::ApplicationSpec;
use crate::util::ServiceName;

/// Tracks which services have already crossed the blocked->eligible edge.
#[derive(Default)]
pub struct DependencyScheduler {
    eligible: DashSet<ServiceName>,
}

impl DependencyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure readiness check: every dependency of `service` has its
    /// readiness key set in `kv`.
    pub fn is_eligible(spec: &ApplicationSpec, kv: &KvStore, service: &ServiceName) -> bool {
        match spec.service(service) {
            Some(s) => s.depends.iter().all(|dep| kv.contains(dep.as_str())),
            None => false,
        }
    }

    /// Whether `service` has already been marked eligible (its WAITING
    /// instances have already been handed to the reconciler once).
    pub fn is_marked_eligible(&self, service: &ServiceName) -> bool {
        self.eligible.contains(service)
    }

    /// Recompute eligibility for `service` and, if this is the first time
    /// it evaluates to ready, mark it and return `true` (the caller should
    /// then hand every currently-WAITING instance to the reconciler).
    /// Returns `false` if the service was already marked eligible or is
    /// still blocked.
    pub fn recheck(&self, spec: &ApplicationSpec, kv: &KvStore, service: &ServiceName) -> bool {
        if self.eligible.contains(service) {
            return false;
        }
        if Self::is_eligible(spec, kv, service) {
            self.eligible.insert(service.clone());
            true
        } else {
            false
        }
    }

    /// Services in `spec` that list `dependency` in their `depends` and
    /// are not yet marked eligible — the candidates to recheck whenever
    /// `dependency`'s readiness key is set.
    pub fn dependents_of<'a>(
        spec: &'a ApplicationSpec,
        dependency: &'a ServiceName,
    ) -> impl Iterator<Item = &'a ServiceName> + 'a {
        spec.services.iter().filter_map(move |(name, service)| {
            service.depends.contains(dependency).then_some(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{build_services, ApplicationSpec, Resources, ServiceSpec};
    use std::collections::{BTreeMap, BTreeSet};

    fn spec_with_chain() -> ApplicationSpec {
        let a = ServiceSpec {
            instances: 1,
            max_restarts: 0,
            resources: Resources {
                memory_mib: 128,
                vcores: 1,
            },
            files: BTreeMap::new(),
            env: BTreeMap::new(),
            commands: vec!["true".into()],
            depends: vec![],
        };
        let mut b = a.clone();
        b.depends = vec![ServiceName::new("a").expect("valid")];

        ApplicationSpec {
            name: "app".into(),
            queue: "default".into(),
            max_attempts: 1,
            tags: BTreeSet::new(),
            services: build_services(vec![("a".into(), a), ("b".into(), b)]).expect("valid"),
        }
    }

    #[test]
    fn service_with_no_dependencies_is_immediately_eligible() {
        let spec = spec_with_chain();
        let kv = KvStore::new();
        let a = ServiceName::new("a").expect("valid");
        assert!(DependencyScheduler::is_eligible(&spec, &kv, &a));
    }

    #[test]
    fn dependent_blocked_until_readiness_key_set() {
        let spec = spec_with_chain();
        let kv = KvStore::new();
        let b = ServiceName::new("b").expect("valid");
        assert!(!DependencyScheduler::is_eligible(&spec, &kv, &b));

        kv.set("a", "ready");
        assert!(DependencyScheduler::is_eligible(&spec, &kv, &b));
    }

    #[test]
    fn recheck_fires_edge_exactly_once() {
        let spec = spec_with_chain();
        let kv = KvStore::new();
        let scheduler = DependencyScheduler::new();
        let b = ServiceName::new("b").expect("valid");

        assert!(!scheduler.recheck(&spec, &kv, &b));
        kv.set("a", "ready");
        assert!(scheduler.recheck(&spec, &kv, &b));
        // Second call after already marked: no repeated edge.
        assert!(!scheduler.recheck(&spec, &kv, &b));
        assert!(scheduler.is_marked_eligible(&b));
    }

    #[test]
    fn dependents_of_finds_direct_dependents_only() {
        let spec = spec_with_chain();
        let a = ServiceName::new("a").expect("valid");
        let dependents: Vec<_> = DependencyScheduler::dependents_of(&spec, &a).collect();
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].as_str(), "b");
    }
}
