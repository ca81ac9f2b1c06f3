//! The YARN ResourceManager boundary the Daemon submits applications
//! through and polls for Application Master endpoint discovery.
//!
//! This is a distinct boundary from [`skein_core::ClusterInterface`]: that
//! trait is the *AM's* view of the cluster (container allocation, once
//! running); this one is the *client's* view (submitting the AM itself
//! and discovering where it ended up), used only before the AM has
//! registered.

// Layer 1: Standard library imports
use std::collections::BTreeSet;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::Deserialize;

// Layer 3: Internal module imports
use crate::error::Result;
use skein_core::ApplicationId;

/// What the Application Master container should run once YARN launches
/// it, and how much it needs to run.
#[derive(Debug, Clone)]
pub struct AmLaunchSpec {
    pub command: String,
    pub memory_mib: u32,
    pub vcores: u32,
}

/// A YARN-level view of a submitted application, as reported by the
/// ResourceManager. `host`/`port` are only populated once the AM has
/// called `register` against the real cluster protocol.
#[derive(Debug, Clone, Default)]
pub struct YarnAppReport {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tracking_url: Option<String>,
    /// The YARN application state string (`ACCEPTED`, `RUNNING`,
    /// `FINISHED`, `FAILED`, `KILLED`), kept as the RM reports it rather
    /// than re-encoded into Skein's own enums — the Daemon only consults
    /// it to decide whether `host`/`port` are meaningful yet.
    pub yarn_state: String,
}

#[async_trait]
pub trait YarnClient: Send + Sync {
    async fn submit_application(
        &self,
        name: &str,
        queue: &str,
        tags: &BTreeSet<String>,
        launch: &AmLaunchSpec,
    ) -> Result<ApplicationId>;

    async fn get_report(&self, id: ApplicationId) -> Result<YarnAppReport>;

    async fn kill_application(&self, id: ApplicationId) -> Result<()>;
}

/// Thin REST client against the YARN ResourceManager's `/ws/v1/cluster`
/// API, standing in for the out-of-scope cluster submission protocol at
/// its interface boundary (mirrors how [`skein_core::ClusterInterface`]
/// stands in for the AM-side protocol).
pub struct ReqwestYarnClient {
    http: reqwest::Client,
    rm_webapp_address: String,
}

impl ReqwestYarnClient {
    pub fn new(rm_webapp_address: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rm_webapp_address: rm_webapp_address.into(),
        }
    }
}

#[derive(Deserialize)]
struct NewApplicationResponse {
    #[serde(rename = "application-id")]
    application_id: String,
}

#[derive(Deserialize)]
struct AppReportEnvelope {
    app: AppReportBody,
}

#[derive(Deserialize)]
struct AppReportBody {
    #[serde(rename = "amHostHttpAddress")]
    am_host_http_address: Option<String>,
    #[serde(rename = "trackingUrl")]
    tracking_url: Option<String>,
    state: String,
}

#[async_trait]
impl YarnClient for ReqwestYarnClient {
    async fn submit_application(
        &self,
        name: &str,
        queue: &str,
        tags: &BTreeSet<String>,
        launch: &AmLaunchSpec,
    ) -> Result<ApplicationId> {
        let new_app: NewApplicationResponse = self
            .http
            .post(format!(
                "{}/ws/v1/cluster/apps/new-application",
                self.rm_webapp_address
            ))
            .send()
            .await?
            .json()
            .await?;

        let body = serde_json::json!({
            "application-id": new_app.application_id,
            "application-name": name,
            "queue": queue,
            "application-tags": tags.iter().cloned().collect::<Vec<_>>(),
            "am-container-spec": {
                "commands": { "command": launch.command },
            },
            "resource": {
                "memory": launch.memory_mib,
                "vCores": launch.vcores,
            },
        });

        self.http
            .post(format!("{}/ws/v1/cluster/apps", self.rm_webapp_address))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(parse_application_id(&new_app.application_id))
    }

    async fn get_report(&self, id: ApplicationId) -> Result<YarnAppReport> {
        let envelope: AppReportEnvelope = self
            .http
            .get(format!(
                "{}/ws/v1/cluster/apps/{id}",
                self.rm_webapp_address
            ))
            .send()
            .await?
            .json()
            .await?;

        let (host, port) = envelope
            .app
            .am_host_http_address
            .as_deref()
            .and_then(split_host_port)
            .unzip();

        Ok(YarnAppReport {
            host,
            port,
            tracking_url: envelope.app.tracking_url,
            yarn_state: envelope.app.state,
        })
    }

    async fn kill_application(&self, id: ApplicationId) -> Result<()> {
        self.http
            .put(format!(
                "{}/ws/v1/cluster/apps/{id}/state",
                self.rm_webapp_address
            ))
            .json(&serde_json::json!({ "state": "KILLED" }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn split_host_port(address: &str) -> Option<(String, u16)> {
    let (host, port) = address.rsplit_once(':')?;
    Some((host.to_string(), port.parse().ok()?))
}

/// YARN application ids are locally-minted UUIDs in this codebase (real
/// YARN ids are `application_<timestamp>_<seq>`); wrap whatever string the
/// RM hands back without attempting to re-derive a UUID from it.
fn parse_application_id(raw: &str) -> ApplicationId {
    let uuid = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, raw.as_bytes());
    ApplicationId::from_uuid(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_host_port_parses_valid_address() {
        assert_eq!(
            split_host_port("10.0.0.5:41000"),
            Some(("10.0.0.5".to_string(), 41000))
        );
    }

    #[test]
    fn split_host_port_rejects_missing_port() {
        assert_eq!(split_host_port("10.0.0.5"), None);
    }
}
