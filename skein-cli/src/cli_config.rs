//! CLI-local configuration: where to find the ResourceManager and how
//! long to wait for an Application Master to register.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the YARN ResourceManager's webapp REST API.
    pub rm_webapp_address: String,

    /// Default timeout, in seconds, for `skein status --wait`.
    pub wait_timeout_secs: u64,

    /// Default output format (text or json).
    pub output_format: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rm_webapp_address: "http://localhost:8088".to_string(),
            wait_timeout_secs: 60,
            output_format: "text".to_string(),
        }
    }
}

impl CliConfig {
    pub fn load() -> crate::error::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> crate::error::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|err| crate::error::CliError::Config(err.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> std::path::PathBuf {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        home_dir.join(".skein").join("config.toml")
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}
