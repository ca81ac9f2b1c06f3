//! Application Master configuration loading: defaults, an optional TOML
//! file, then environment variable overrides — in that order, matching
//! the override precedence `skein-core`'s `MasterConfig` builder is
//! designed to be driven by.

// Layer 1: Standard library imports
use std::path::{Path, PathBuf};
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::Deserialize;

// Layer 3: Internal module imports
use crate::error::Result;
use skein_core::MasterConfig;

/// Everything `skein-am` needs beyond the coordination-engine defaults in
/// [`MasterConfig`].
#[derive(Debug, Clone)]
pub struct AmConfig {
    pub master: MasterConfig,
    /// Base URL of the YARN ResourceManager's webapp REST API, used by
    /// [`crate::yarn::YarnRestCluster`].
    pub rm_webapp_address: String,
    /// Path to the application spec JSON this AM was launched with.
    pub application_spec_path: PathBuf,
    /// OS user the application was submitted as, surfaced on
    /// `ApplicationReport`.
    pub user: String,
}

impl Default for AmConfig {
    fn default() -> Self {
        Self {
            master: MasterConfig::default(),
            rm_webapp_address: "http://localhost:8088".to_string(),
            application_spec_path: PathBuf::from("application_spec.json"),
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
        }
    }
}

/// Deserialized shape of the optional TOML config file; every field is
/// optional so a file only needs to name the overrides it actually wants.
#[derive(Debug, Default, Deserialize)]
struct AmFileConfig {
    max_cluster_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
    shutdown_grace_secs: Option<u64>,
    bind_addr: Option<String>,
    rm_webapp_address: Option<String>,
    application_spec_path: Option<PathBuf>,
    user: Option<String>,
}

impl AmConfig {
    /// Load defaults, overlay an optional TOML file, then overlay
    /// `SKEIN_AM_*` environment variables.
    pub fn load(file_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = file_path {
            let text = std::fs::read_to_string(path)?;
            let file: AmFileConfig = toml::from_str(&text)?;
            config.apply_file(file);
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_file(&mut self, file: AmFileConfig) {
        let mut builder = MasterConfig::builder();
        if let Some(retries) = file.max_cluster_retries {
            builder = builder.with_max_cluster_retries(retries);
        }
        if let Some(ms) = file.retry_base_delay_ms {
            builder = builder.with_retry_base_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = file.retry_max_delay_ms {
            builder = builder.with_retry_max_delay(Duration::from_millis(ms));
        }
        if let Some(secs) = file.shutdown_grace_secs {
            builder = builder.with_shutdown_grace(Duration::from_secs(secs));
        }
        if let Some(addr) = file.bind_addr {
            builder = builder.with_bind_addr(addr);
        }
        self.master = builder.build();

        if let Some(rm) = file.rm_webapp_address {
            self.rm_webapp_address = rm;
        }
        if let Some(path) = file.application_spec_path {
            self.application_spec_path = path;
        }
        if let Some(user) = file.user {
            self.user = user;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("SKEIN_AM_BIND_ADDR") {
            self.master.bind_addr = addr;
        }
        if let Ok(rm) = std::env::var("SKEIN_AM_RM_WEBAPP_ADDRESS") {
            self.rm_webapp_address = rm;
        }
        if let Ok(retries) = std::env::var("SKEIN_AM_MAX_CLUSTER_RETRIES") {
            if let Ok(retries) = retries.parse() {
                self.master.max_cluster_retries = retries;
            }
        }
        if let Ok(path) = std::env::var("SKEIN_AM_APPLICATION_SPEC_PATH") {
            self.application_spec_path = PathBuf::from(path);
        }
    }
}
