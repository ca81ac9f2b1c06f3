//! The client-side Daemon contract (§4.H): submit/status/kill against a
//! submitted application, discovering the Application Master's RPC
//! endpoint through [`crate::yarn::YarnClient`] and caching it in a
//! [`PointerStore`] so repeat calls don't re-query the ResourceManager.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use crate::error::{ClientError, Result};
use crate::pointer::{PointerEntry, PointerStore};
use crate::yarn::{AmLaunchSpec, YarnAppReport, YarnClient};
use skein_core::api::{ErrorBody, ShutdownRequest};
use skein_core::cluster::FinalStatus;
use skein_core::{ApplicationId, ApplicationReport, ApplicationSpec, ApplicationState};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Client-facing facade over a submitted application's lifecycle.
pub struct Daemon {
    yarn: Arc<dyn YarnClient>,
    pointers: PointerStore,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl Daemon {
    pub fn new(yarn: Arc<dyn YarnClient>) -> Self {
        Self {
            yarn,
            pointers: PointerStore::default_location(),
            http: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_pointer_store(mut self, pointers: PointerStore) -> Self {
        self.pointers = pointers;
        self
    }

    /// Submit an application, returning the id YARN assigned. The
    /// resulting pointer file lets later calls find this application by
    /// id without re-asking the ResourceManager which applications exist.
    pub async fn submit(&self, spec: &ApplicationSpec, launch: AmLaunchSpec) -> Result<ApplicationId> {
        let id = self
            .yarn
            .submit_application(&spec.name, &spec.queue, &spec.tags, &launch)
            .await?;

        self.pointers
            .save(&PointerEntry {
                id,
                name: spec.name.clone(),
                submitted_at: Utc::now(),
            })
            .await?;

        debug!(%id, name = %spec.name, "client: application submitted");
        Ok(id)
    }

    /// Fetch the live status from the Application Master itself. Fails
    /// with [`ClientError::NotYetRegistered`] until YARN reports the AM's
    /// address.
    pub async fn get_status(&self, id: ApplicationId) -> Result<ApplicationReport> {
        let YarnAppReport { host, port, .. } = self.yarn.get_report(id).await?;
        let (host, port) = match (host, port) {
            (Some(host), Some(port)) => (host, port),
            _ => return Err(ClientError::NotYetRegistered(id.to_string())),
        };

        let response = self
            .http
            .get(format!("http://{host}:{port}/status"))
            .send()
            .await?;

        if !response.status().is_success() {
            let body: ErrorBody = response.json().await?;
            return Err(ClientError::Master {
                kind: body.kind,
                message: body.message,
            });
        }

        Ok(response.json::<ApplicationReport>().await?)
    }

    /// `ping` (§4.H): a cheap reachability check, true iff `get_status`
    /// succeeds.
    pub async fn ping(&self, id: ApplicationId) -> Result<bool> {
        Ok(self.get_status(id).await.is_ok())
    }

    /// Poll `get_status` with exponential backoff until the AM has
    /// registered (has a host/port) or `timeout` elapses. The Daemon has
    /// no push channel from the AM in this design, so polling is the only
    /// option (§9: "waitForStart is a bounded poll-with-backoff").
    pub async fn wait_for_start(&self, id: ApplicationId, timeout: Duration) -> Result<ApplicationReport> {
        let poll = async {
            let mut delay = self.poll_interval;
            loop {
                if let Ok(report) = self.get_status(id).await {
                    if report.host.is_some() {
                        return report;
                    }
                }
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, MAX_POLL_INTERVAL);
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ClientError::Timeout {
                id: id.to_string(),
                waited_secs: timeout.as_secs(),
            })
    }

    /// `getApplications` (§4.H), composed client-side from every pointer
    /// file this client knows about rather than a server-side AM query —
    /// there is exactly one AM per application (§5), so there is no
    /// central place to ask "list every application" from.
    pub async fn get_applications(
        &self,
        states: Option<&[ApplicationState]>,
    ) -> Result<Vec<ApplicationReport>> {
        let mut reports = Vec::new();
        for entry in self.pointers.list().await? {
            match self.get_status(entry.id).await {
                Ok(report) => {
                    if states.is_none_or(|wanted| wanted.contains(&report.state)) {
                        reports.push(report);
                    }
                }
                Err(ClientError::NotYetRegistered(_)) => {}
                Err(err) => warn!(id = %entry.id, %err, "client: failed to fetch status"),
            }
        }
        Ok(reports)
    }

    /// `kill` (§4.H): a graceful shutdown through the AM's own Master RPC
    /// if it has registered, else a forceful kill through the
    /// ResourceManager.
    pub async fn kill(&self, id: ApplicationId) -> Result<()> {
        let YarnAppReport { host, port, .. } = self.yarn.get_report(id).await?;
        match (host, port) {
            (Some(host), Some(port)) => {
                let body = ShutdownRequest {
                    final_status: FinalStatus::Killed,
                    diagnostics: "killed by client".to_string(),
                };
                self.http
                    .post(format!("http://{host}:{port}/shutdown"))
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(())
            }
            _ => self.yarn.kill_application(id).await,
        }
    }
}
