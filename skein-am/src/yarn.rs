//! `YarnRestCluster`: a thin REST client standing in for the YARN
//! AM-RM/NM protocols at the [`ClusterInterface`] boundary (§6, §1 "the
//! cluster's resource-negotiation and container-launch protocols are
//! specified only at their interface boundary").
//!
//! Real YARN speaks a protobuf RPC here, not REST; this crate only needs
//! *a* implementation of the trait to drive the reconciler against a live
//! cluster, so it talks to the same ResourceManager webapp surface
//! `skein-client` uses for submission, extended with the per-application
//! endpoints an AM would use once registered.

// Layer 1: Standard library imports
use std::collections::BTreeMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use skein_core::cluster::{
    Allocated, ClusterError, ClusterEvents, ClusterInterface, Completed, FinalStatus,
    LaunchContext, ResourceRequest,
};
use skein_core::{ApplicationId, ContainerId};

/// Margin added on top of the requested long-poll wait when setting the
/// HTTP request's own timeout, so a server that takes the full wait to
/// reply is not cut off by the client first.
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

pub struct YarnRestCluster {
    http: reqwest::Client,
    rm_webapp_address: String,
    application_id: ApplicationId,
    poll_timeout: Duration,
}

impl YarnRestCluster {
    pub fn new(
        rm_webapp_address: impl Into<String>,
        application_id: ApplicationId,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            rm_webapp_address: rm_webapp_address.into(),
            application_id,
            poll_timeout,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/ws/v1/cluster/apps/{}{suffix}",
            self.rm_webapp_address, self.application_id
        )
    }

    fn to_transport_error(err: reqwest::Error) -> ClusterError {
        ClusterError::Transport(err.to_string())
    }

    /// Fetch the cluster's maximum per-container allocation, used to
    /// validate the application spec before any container is requested.
    pub async fn fetch_cluster_max(
        rm_webapp_address: &str,
    ) -> Result<skein_core::spec::Resources, reqwest::Error> {
        #[derive(Deserialize)]
        struct MetricsEnvelope {
            #[serde(rename = "clusterMetrics")]
            cluster_metrics: ClusterMetrics,
        }
        #[derive(Deserialize)]
        struct ClusterMetrics {
            #[serde(rename = "maximumAllocationMB")]
            maximum_allocation_mb: u32,
            #[serde(rename = "maximumAllocationVCores")]
            maximum_allocation_vcores: u32,
        }

        let url = format!("{rm_webapp_address}/ws/v1/cluster/metrics");
        let envelope: MetricsEnvelope = reqwest::Client::new()
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(skein_core::spec::Resources {
            memory_mib: envelope.cluster_metrics.maximum_allocation_mb,
            vcores: envelope.cluster_metrics.maximum_allocation_vcores,
        })
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    host: &'a str,
    port: u16,
    #[serde(rename = "trackingUrl")]
    tracking_url: &'a str,
}

#[derive(Serialize)]
struct UnregisterBody<'a> {
    #[serde(rename = "finalStatus")]
    final_status: FinalStatus,
    diagnostics: &'a str,
}

#[derive(Serialize)]
struct ResourceRequestBody {
    service: String,
    instance: u32,
    #[serde(rename = "memoryMib")]
    memory_mib: u32,
    vcores: u32,
}

#[derive(Serialize)]
struct LaunchBody {
    files: BTreeMap<String, skein_core::spec::File>,
    env: BTreeMap<String, String>,
    commands: Vec<String>,
}

#[derive(Deserialize, Default)]
struct EventsBody {
    #[serde(default)]
    allocated: Vec<AllocatedBody>,
    #[serde(default)]
    completed: Vec<CompletedBody>,
    #[serde(default)]
    shutdown_requested: bool,
}

#[derive(Deserialize)]
struct AllocatedBody {
    #[serde(rename = "containerId")]
    container_id: String,
    #[serde(rename = "memoryMib")]
    memory_mib: u32,
    vcores: u32,
}

#[derive(Deserialize)]
struct CompletedBody {
    #[serde(rename = "containerId")]
    container_id: String,
    #[serde(rename = "exitStatus")]
    exit_status: i32,
    #[serde(default)]
    preempted: bool,
    #[serde(default)]
    diagnostics: String,
}

#[async_trait]
impl ClusterInterface for YarnRestCluster {
    async fn register(
        &self,
        host: &str,
        port: u16,
        tracking_url: &str,
    ) -> Result<(), ClusterError> {
        self.http
            .post(self.url("/register"))
            .json(&RegisterBody {
                host,
                port,
                tracking_url,
            })
            .send()
            .await
            .map_err(Self::to_transport_error)?
            .error_for_status()
            .map_err(Self::to_transport_error)?;
        Ok(())
    }

    async fn unregister(
        &self,
        final_status: FinalStatus,
        diagnostics: &str,
    ) -> Result<(), ClusterError> {
        self.http
            .post(self.url("/unregister"))
            .json(&UnregisterBody {
                final_status,
                diagnostics,
            })
            .send()
            .await
            .map_err(Self::to_transport_error)?
            .error_for_status()
            .map_err(Self::to_transport_error)?;
        Ok(())
    }

    async fn request_containers(
        &self,
        requests: Vec<ResourceRequest>,
    ) -> Result<(), ClusterError> {
        let body: Vec<ResourceRequestBody> = requests
            .into_iter()
            .map(|r| ResourceRequestBody {
                service: r.service,
                instance: r.instance,
                memory_mib: r.resources.memory_mib,
                vcores: r.resources.vcores,
            })
            .collect();
        self.http
            .post(self.url("/containers/request"))
            .json(&body)
            .send()
            .await
            .map_err(Self::to_transport_error)?
            .error_for_status()
            .map_err(Self::to_transport_error)?;
        Ok(())
    }

    async fn release_container(&self, container_id: &ContainerId) -> Result<(), ClusterError> {
        self.http
            .post(self.url(&format!("/containers/{container_id}/release")))
            .send()
            .await
            .map_err(Self::to_transport_error)?
            .error_for_status()
            .map_err(Self::to_transport_error)?;
        Ok(())
    }

    async fn launch_container(
        &self,
        container_id: &ContainerId,
        context: LaunchContext,
    ) -> Result<(), ClusterError> {
        self.http
            .post(self.url(&format!("/containers/{container_id}/launch")))
            .json(&LaunchBody {
                files: context.files,
                env: context.env,
                commands: context.commands,
            })
            .send()
            .await
            .map_err(Self::to_transport_error)?
            .error_for_status()
            .map_err(Self::to_transport_error)?;
        Ok(())
    }

    async fn stop_container(&self, container_id: &ContainerId) -> Result<(), ClusterError> {
        self.http
            .post(self.url(&format!("/containers/{container_id}/stop")))
            .send()
            .await
            .map_err(Self::to_transport_error)?
            .error_for_status()
            .map_err(Self::to_transport_error)?;
        Ok(())
    }

    async fn poll_events(&self) -> ClusterEvents {
        // Ask the cluster to hold the request open until an event is
        // available or `waitMs` elapses, so an idle application does not
        // spin the reconciler loop in a tight request cycle; the client
        // timeout is set a little longer so a full-length wait on the
        // server side is not mistaken for a transport failure.
        let response = match self
            .http
            .get(self.url("/events"))
            .query(&[("waitMs", self.poll_timeout.as_millis().to_string())])
            .timeout(self.poll_timeout + POLL_TIMEOUT_MARGIN)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%err, "yarn: poll_events transport error");
                return ClusterEvents::default();
            }
        };
        let body: EventsBody = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%err, "yarn: poll_events malformed response");
                return ClusterEvents::default();
            }
        };

        ClusterEvents {
            allocated: body
                .allocated
                .into_iter()
                .map(|a| Allocated {
                    container_id: ContainerId::new(a.container_id),
                    resources: skein_core::spec::Resources {
                        memory_mib: a.memory_mib,
                        vcores: a.vcores,
                    },
                })
                .collect(),
            completed: body
                .completed
                .into_iter()
                .map(|c| Completed {
                    container_id: ContainerId::new(c.container_id),
                    exit_status: c.exit_status,
                    preempted: c.preempted,
                    diagnostics: c.diagnostics,
                })
                .collect(),
            shutdown_requested: body.shutdown_requested,
        }
    }
}
