//! Spec validation (§4.A): total — either the whole spec is accepted, or
//! it is rejected atomically before any container is requested.

// Layer 1: Standard library imports
use std::collections::{BTreeMap, HashMap};

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use super::types::{ApplicationSpec, Resources, ServiceSpec};
use crate::util::ServiceName;

/// Every way a submitted spec can be rejected. Kept as one flat enum
/// (rather than nested per-service errors) so the AM RPC surface can turn
/// any variant into an `INVALID_ARGUMENT` or `RESOURCE_EXHAUSTED` response
/// with a single match.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error("duplicate service name: {0}")]
    DuplicateService(String),

    #[error("service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    #[error("dependency cycle detected, starting at '{0}'")]
    DependencyCycle(String),

    #[error("service '{service}' has non-positive resource request ({memory_mib} MiB, {vcores} vcores)")]
    NonPositiveResource {
        service: String,
        memory_mib: u32,
        vcores: u32,
    },

    #[error("service '{service}' requests more than the cluster maximum")]
    ResourceExceedsClusterMax { service: String },

    #[error("service '{0}' has an empty command list")]
    EmptyCommands(String),
}

/// Build an [`ApplicationSpec`] from raw `(name, spec)` entries, rejecting
/// duplicate or empty names before they collapse silently into a map.
pub fn build_services(
    entries: Vec<(String, ServiceSpec)>,
) -> Result<BTreeMap<ServiceName, ServiceSpec>, ValidationError> {
    let mut seen = std::collections::HashSet::new();
    let mut out = BTreeMap::new();
    for (raw_name, spec) in entries {
        if raw_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !seen.insert(raw_name.clone()) {
            return Err(ValidationError::DuplicateService(raw_name));
        }
        let name = ServiceName::new(raw_name.clone())
            .map_err(|_| ValidationError::EmptyName)?;
        out.insert(name, spec);
    }
    Ok(out)
}

/// Validate a fully-constructed spec against the cluster's reported
/// maximum per-container resources.
///
/// Checks run in a fixed order but all structural errors (unknown
/// dependency, cycle, bad resources, empty commands) are independent of
/// each other; the first violation found is returned. No container is
/// requested unless this returns `Ok`.
pub fn validate(spec: &ApplicationSpec, cluster_max: Resources) -> Result<(), ValidationError> {
    for (name, service) in &spec.services {
        if service.commands.is_empty() {
            return Err(ValidationError::EmptyCommands(name.to_string()));
        }
        if service.resources.memory_mib == 0 || service.resources.vcores == 0 {
            return Err(ValidationError::NonPositiveResource {
                service: name.to_string(),
                memory_mib: service.resources.memory_mib,
                vcores: service.resources.vcores,
            });
        }
        if !service.resources.fits_within(cluster_max) {
            return Err(ValidationError::ResourceExceedsClusterMax {
                service: name.to_string(),
            });
        }
        for dep in &service.depends {
            if !spec.services.contains_key(dep) {
                return Err(ValidationError::UnknownDependency {
                    service: name.to_string(),
                    dependency: dep.to_string(),
                });
            }
        }
    }

    detect_cycle(spec)
}

/// Three-color DFS cycle detection over the `depends` edges.
fn detect_cycle(spec: &ApplicationSpec) -> Result<(), ValidationError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<&ServiceName, Mark> = HashMap::new();

    fn visit<'a>(
        spec: &'a ApplicationSpec,
        name: &'a ServiceName,
        marks: &mut HashMap<&'a ServiceName, Mark>,
    ) -> Result<(), ValidationError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(ValidationError::DependencyCycle(name.to_string()))
            }
            None => {}
        }
        marks.insert(name, Mark::InProgress);
        if let Some(service) = spec.services.get(name) {
            for dep in &service.depends {
                visit(spec, dep, marks)?;
            }
        }
        marks.insert(name, Mark::Done);
        Ok(())
    }

    for name in spec.services.keys() {
        visit(spec, name, &mut marks)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::types::{FileKind, Visibility};
    use std::collections::{BTreeMap as Map, BTreeSet};

    fn service(depends: Vec<&str>) -> ServiceSpec {
        ServiceSpec {
            instances: 1,
            max_restarts: 0,
            resources: Resources {
                memory_mib: 512,
                vcores: 1,
            },
            files: Map::new(),
            env: Map::new(),
            commands: vec!["echo hi".into()],
            depends: depends
                .into_iter()
                .map(|d| ServiceName::new(d).expect("valid"))
                .collect(),
        }
    }

    fn spec_with(services: Vec<(&str, ServiceSpec)>) -> ApplicationSpec {
        ApplicationSpec {
            name: "app".into(),
            queue: "default".into(),
            max_attempts: 1,
            tags: BTreeSet::new(),
            services: build_services(
                services
                    .into_iter()
                    .map(|(n, s)| (n.to_string(), s))
                    .collect(),
            )
            .expect("valid entries"),
        }
    }

    const CLUSTER_MAX: Resources = Resources {
        memory_mib: 4096,
        vcores: 4,
    };

    #[test]
    fn accepts_simple_chain() {
        let spec = spec_with(vec![("a", service(vec![])), ("b", service(vec!["a"]))]);
        assert!(validate(&spec, CLUSTER_MAX).is_ok());
    }

    #[test]
    fn rejects_unknown_dependency() {
        let spec = spec_with(vec![("a", service(vec!["missing"]))]);
        assert_eq!(
            validate(&spec, CLUSTER_MAX),
            Err(ValidationError::UnknownDependency {
                service: "a".into(),
                dependency: "missing".into(),
            })
        );
    }

    #[test]
    fn rejects_cycle() {
        let spec = spec_with(vec![("a", service(vec!["b"])), ("b", service(vec!["a"]))]);
        assert!(matches!(
            validate(&spec, CLUSTER_MAX),
            Err(ValidationError::DependencyCycle(_))
        ));
    }

    #[test]
    fn rejects_duplicate_names_before_map_collapses() {
        let err = build_services(vec![
            ("a".to_string(), service(vec![])),
            ("a".to_string(), service(vec![])),
        ])
        .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateService("a".into()));
    }

    #[test]
    fn rejects_empty_commands() {
        let mut bad = service(vec![]);
        bad.commands.clear();
        let spec = spec_with(vec![("a", bad)]);
        assert_eq!(
            validate(&spec, CLUSTER_MAX),
            Err(ValidationError::EmptyCommands("a".into()))
        );
    }

    #[test]
    fn rejects_resources_over_cluster_max() {
        let mut too_big = service(vec![]);
        too_big.resources = Resources {
            memory_mib: 8192,
            vcores: 1,
        };
        let spec = spec_with(vec![("a", too_big)]);
        assert_eq!(
            validate(&spec, CLUSTER_MAX),
            Err(ValidationError::ResourceExceedsClusterMax {
                service: "a".into()
            })
        );
    }

    #[test]
    fn rejects_zero_resources() {
        let mut zero = service(vec![]);
        zero.resources = Resources {
            memory_mib: 0,
            vcores: 1,
        };
        let spec = spec_with(vec![("a", zero)]);
        assert!(matches!(
            validate(&spec, CLUSTER_MAX),
            Err(ValidationError::NonPositiveResource { .. })
        ));
    }

    #[test]
    fn file_metadata_roundtrips() {
        let file = super::super::types::File {
            source: "hdfs:///data.tar.gz".into(),
            kind: FileKind::Archive,
            visibility: Visibility::Application,
            size: 1024,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&file).expect("serialize");
        let back: super::super::types::File = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(file, back);
    }

    /// Builds a spec of `n` services named `"0".."n"` where service `i`
    /// depends on `i - 1` for every `i` in `back_edges` — a forward chain
    /// plus the given set of extra edges, each pointing at a strictly lower
    /// index so the graph stays acyclic by construction.
    fn dag_spec(n: usize, extra_edges: &[(usize, usize)]) -> ApplicationSpec {
        let mut services: Vec<(&str, ServiceSpec)> = Vec::new();
        let names: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let mut depends_by_index: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &(from, to) in extra_edges {
            if from < n && to < from {
                depends_by_index[from].push(to);
            }
        }
        for i in 0..n {
            let depends: Vec<&str> = depends_by_index[i]
                .iter()
                .map(|&j| names[j].as_str())
                .collect();
            services.push((names[i].as_str(), service(depends)));
        }
        spec_with(services)
    }

    proptest::proptest! {
        /// Any spec built from `dag_spec` only points edges at lower indices,
        /// so it can never contain a cycle: validation must always accept it
        /// (modulo the unrelated resource/command checks, held fixed here).
        #[test]
        fn dag_specs_never_report_a_cycle(
            n in 1usize..12,
            edges in proptest::collection::vec((0usize..12, 0usize..12), 0..20),
        ) {
            let spec = dag_spec(n, &edges);
            let result = validate(&spec, CLUSTER_MAX);
            proptest::prop_assert!(!matches!(result, Err(ValidationError::DependencyCycle(_))));
        }

        /// Closing a forward chain with a single back-edge from the last
        /// service to the first always introduces exactly one cycle, which
        /// must always be rejected regardless of chain length.
        #[test]
        fn closing_a_chain_into_a_ring_is_always_rejected(n in 2usize..12) {
            let mut edges: Vec<(usize, usize)> = Vec::new();
            let mut services: Vec<(&str, ServiceSpec)> = Vec::new();
            let names: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            for i in 1..n {
                edges.push((i, i - 1));
            }
            let last = service(vec![names[0].as_str()]);
            for (i, name) in names.iter().enumerate().take(n - 1) {
                let depends = if i == 0 { vec![] } else { vec![names[i - 1].as_str()] };
                services.push((name.as_str(), service(depends)));
            }
            services.push((names[n - 1].as_str(), last));
            let spec = spec_with(services);
            proptest::prop_assert!(matches!(
                validate(&spec, CLUSTER_MAX),
                Err(ValidationError::DependencyCycle(_))
            ));
        }
    }
}
