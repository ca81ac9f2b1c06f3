//! Application Master configuration with sensible defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum number of reconciler retries against the cluster
/// interface before the AM gives up and terminates with `final_status =
/// FAILED` (§7: "persistent failure ... exceeding the retry budget").
pub const DEFAULT_MAX_CLUSTER_RETRIES: u32 = 8;

/// Default base delay for the reconciler's exponential backoff against
/// cluster-interface failures.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Default cap for the reconciler's exponential backoff.
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default grace period `shutdown` waits for containers to acknowledge a
/// kill before the AM unregisters unconditionally.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Default bind address for the Master RPC server.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:0";

/// Default long-poll timeout for `ClusterInterface::poll_events`: how long
/// a concrete implementation should block waiting for an event before
/// returning an empty batch (§6: "block until at least one event is
/// available, or return an empty batch after an implementation-defined
/// timeout").
pub const DEFAULT_EVENT_POLL_TIMEOUT: Duration = Duration::from_secs(20);

/// System-wide configuration for the Application Master runtime.
///
/// Mirrors the defaults-plus-builder shape used elsewhere in this
/// codebase: a `Default` impl for the common case, and a builder for
/// callers (primarily `skein-am`'s config loader) who need to override
/// individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Maximum cluster-interface retries before declaring `UNAVAILABLE`
    /// permanent and terminating the application.
    pub max_cluster_retries: u32,

    /// Base delay for exponential backoff between cluster-interface
    /// retries.
    #[serde(with = "crate::util::duration_serde")]
    pub retry_base_delay: Duration,

    /// Maximum delay for exponential backoff between cluster-interface
    /// retries.
    #[serde(with = "crate::util::duration_serde")]
    pub retry_max_delay: Duration,

    /// Grace period for `shutdown` to let in-flight kills land before the
    /// AM unregisters unconditionally.
    #[serde(with = "crate::util::duration_serde")]
    pub shutdown_grace: Duration,

    /// Address the Master RPC server binds to.
    pub bind_addr: String,

    /// How long a [`crate::cluster::ClusterInterface::poll_events`]
    /// implementation should long-poll before returning an empty batch.
    /// Gives the reconciler's otherwise unconditional poll loop a bounded
    /// idle wait instead of spinning against an idle cluster.
    #[serde(with = "crate::util::duration_serde")]
    pub event_poll_timeout: Duration,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            max_cluster_retries: DEFAULT_MAX_CLUSTER_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            retry_max_delay: DEFAULT_RETRY_MAX_DELAY,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            event_poll_timeout: DEFAULT_EVENT_POLL_TIMEOUT,
        }
    }
}

impl MasterConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> MasterConfigBuilder {
        MasterConfigBuilder::default()
    }
}

/// Builder for [`MasterConfig`].
#[derive(Debug, Default)]
pub struct MasterConfigBuilder {
    config: Option<MasterConfig>,
}

impl MasterConfigBuilder {
    fn config_mut(&mut self) -> &mut MasterConfig {
        self.config.get_or_insert_with(MasterConfig::default)
    }

    /// Override the cluster-interface retry budget.
    pub fn with_max_cluster_retries(mut self, retries: u32) -> Self {
        self.config_mut().max_cluster_retries = retries;
        self
    }

    /// Override the exponential backoff base delay.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.config_mut().retry_base_delay = delay;
        self
    }

    /// Override the exponential backoff cap.
    pub fn with_retry_max_delay(mut self, delay: Duration) -> Self {
        self.config_mut().retry_max_delay = delay;
        self
    }

    /// Override the shutdown grace period.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.config_mut().shutdown_grace = grace;
        self
    }

    /// Override the RPC bind address.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_mut().bind_addr = addr.into();
        self
    }

    /// Override the cluster event long-poll timeout.
    pub fn with_event_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config_mut().event_poll_timeout = timeout;
        self
    }

    /// Finalize the configuration.
    pub fn build(self) -> MasterConfig {
        self.config.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_constants() {
        let config = MasterConfig::default();
        assert_eq!(config.max_cluster_retries, DEFAULT_MAX_CLUSTER_RETRIES);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = MasterConfig::builder()
            .with_max_cluster_retries(3)
            .with_bind_addr("127.0.0.1:9090")
            .build();

        assert_eq!(config.max_cluster_retries, 3);
        assert_eq!(config.bind_addr, "127.0.0.1:9090");
        assert_eq!(config.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
    }
}
