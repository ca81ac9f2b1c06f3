//! Direct calls against a running Application Master's Master RPC surface
//! for the parts of the CLI (`container`, `kv`) that fall outside
//! `skein-client`'s narrow Daemon contract (submit/status/kill only,
//! per §4.H) but still need to talk to the same endpoint the Daemon
//! discovers via `getStatus`.

use skein_core::api::{
    ErrorBody, GetContainersResponse, KvGetResponse, KvListResponse, KvSetRequest,
};
use skein_core::registry::ContainerRecord;

use crate::error::{CliError, Result};

pub struct MasterRpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl MasterRpcClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}"),
        }
    }

    /// Build a client from an `ApplicationReport`, failing with the same
    /// `NotYetRegistered`-style diagnostic `skein-client` uses when the
    /// Application Master hasn't reported its endpoint yet.
    pub fn from_report(report: &skein_core::ApplicationReport) -> Result<Self> {
        match (&report.host, report.port) {
            (Some(host), Some(port)) => Ok(Self::new(host, *port)),
            _ => Err(CliError::Unreachable(
                "application has not yet registered its Application Master".to_string(),
            )),
        }
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let body: ErrorBody = response.json().await?;
        Err(match body.kind {
            skein_core::ErrorKind::NotFound => CliError::NotFound(body.message),
            skein_core::ErrorKind::Unavailable => CliError::Unreachable(body.message),
            _ => CliError::InvalidArgument(body.message),
        })
    }

    pub async fn get_containers(&self, service: Option<&str>) -> Result<Vec<ContainerRecord>> {
        let mut url = format!("{}/containers", self.base_url);
        if let Some(service) = service {
            url.push_str(&format!("?services={service}"));
        }
        let response = Self::error_for_status(self.http.get(url).send().await?).await?;
        Ok(response.json::<GetContainersResponse>().await?.containers)
    }

    pub async fn kill_container(&self, service: &str, instance: u32) -> Result<()> {
        let url = format!("{}/services/{service}/instances/{instance}", self.base_url);
        Self::error_for_status(self.http.delete(url).send().await?).await?;
        Ok(())
    }

    pub async fn kv_get(&self, key: &str) -> Result<String> {
        let url = format!("{}/kv/{key}?wait=false", self.base_url);
        let response = Self::error_for_status(self.http.get(url).send().await?).await?;
        Ok(response.json::<KvGetResponse>().await?.value)
    }

    pub async fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        let url = format!("{}/kv/{key}", self.base_url);
        let body = KvSetRequest {
            value: value.to_string(),
        };
        Self::error_for_status(self.http.post(url).json(&body).send().await?).await?;
        Ok(())
    }

    pub async fn kv_del(&self, key: &str) -> Result<()> {
        let url = format!("{}/kv/{key}", self.base_url);
        Self::error_for_status(self.http.delete(url).send().await?).await?;
        Ok(())
    }

    pub async fn kv_list(&self) -> Result<std::collections::HashMap<String, String>> {
        let url = format!("{}/kv", self.base_url);
        let response = Self::error_for_status(self.http.get(url).send().await?).await?;
        Ok(response.json::<KvListResponse>().await?.entries)
    }
}
