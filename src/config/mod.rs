// ABOUTME: Configuration types and parsing for railyard.yml.
// ABOUTME: Handles YAML parsing, defaults, and per-service rollout settings.

mod init;

pub use init::init_config;

use crate::deploy::HaltPolicy;
use crate::error::{Error, Result};
use crate::types::{ServiceKind, ServiceName};
use nonempty::NonEmpty;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "railyard.yml";
pub const CONFIG_FILENAME_ALT: &str = "railyard.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Platform project id (or name, before the project is provisioned).
    pub project: String,

    pub workspace: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    /// Path to the platform CLI binary.
    #[serde(default = "default_cli_binary")]
    pub cli_binary: PathBuf,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Highest deploy order still in the critical tier: a failure at or
    /// below it halts a bulk rollout.
    #[serde(default = "default_critical_order_max")]
    pub critical_order_max: u32,

    /// Overrides the executor's default deploy budget when set.
    #[serde(default, with = "humantime_serde::option")]
    pub deploy_timeout: Option<Duration>,

    /// How long to wait for a provisioned service to report active.
    #[serde(default = "default_readiness_timeout", with = "humantime_serde")]
    pub readiness_timeout: Duration,

    #[serde(deserialize_with = "deserialize_services")]
    pub services: NonEmpty<ServiceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: ServiceName,

    pub kind: ServiceKind,

    #[serde(default)]
    pub deploy_order: u32,

    /// Platform-assigned service id, once known.
    #[serde(default)]
    pub platform_id: Option<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default)]
    pub custom_domain: Option<String>,
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_cli_binary() -> PathBuf {
    PathBuf::from("railway")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".railyard/state.json")
}

fn default_critical_order_max() -> u32 {
    1
}

fn default_readiness_timeout() -> Duration {
    Duration::from_secs(180)
}

fn deserialize_services<'de, D>(deserializer: D) -> std::result::Result<NonEmpty<ServiceConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<ServiceConfig>::deserialize(deserializer)?;
    NonEmpty::from_vec(raw)
        .ok_or_else(|| serde::de::Error::custom("at least one service is required"))
}

impl Config {
    /// Find and load the config file in `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        for filename in [CONFIG_FILENAME, CONFIG_FILENAME_ALT] {
            let path = dir.join(filename);
            if path.is_file() {
                return Self::load(&path);
            }
        }
        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for service in self.services.iter() {
            if !seen.insert(service.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate service name: {}",
                    service.name
                )));
            }
        }
        Ok(())
    }

    pub fn halt_policy(&self) -> HaltPolicy {
        HaltPolicy {
            critical_order_max: self.critical_order_max,
        }
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name.as_str() == name)
    }
}
