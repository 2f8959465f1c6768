//! Configuration file handling

use serde::Deserialize;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Environment variable overriding the test namespace prefix
pub const NAMESPACE_ENV: &str = "KN_E2E_NAMESPACE";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Retry and polling settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Cluster client settings
    #[serde(default)]
    pub cluster: ClusterConfig,
}

/// What a poll reports once its attempt budget runs out
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Report a timeout error
    #[default]
    Fail,
    /// Report success anyway
    Succeed,
}

/// Retry settings shared by the create retry loop and the namespace poller
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per operation
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Outcome of a poll that never saw the expected state
    #[serde(default)]
    pub on_exhausted: ExhaustionPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
            on_exhausted: ExhaustionPolicy::default(),
        }
    }
}

impl RetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_max_attempts() -> u32 {
    10
}
fn default_interval_secs() -> u64 {
    5
}

/// Cluster client settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Control-plane client binary
    #[serde(default = "default_kubectl")]
    pub kubectl: String,

    /// Knative client binary
    #[serde(default = "default_kn")]
    pub kn: String,

    /// Prefix for generated test namespaces
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,

    /// Image used for test services
    #[serde(default = "default_test_image")]
    pub test_image: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl(),
            kn: default_kn(),
            namespace_prefix: default_namespace_prefix(),
            test_image: default_test_image(),
        }
    }
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}
fn default_kn() -> String {
    "kn".to_string()
}
fn default_namespace_prefix() -> String {
    "kne2etests".to_string()
}
fn default_test_image() -> String {
    "gcr.io/knative-samples/helloworld-go".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist. The
    /// namespace prefix can be overridden from the environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_path() {
            if path.exists() {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| super::Error::file_read(&path, &e))?;
                config = Self::parse(&content)?;
            }
        }
        if let Ok(prefix) = std::env::var(NAMESPACE_ENV) {
            if !prefix.is_empty() {
                config.cluster.namespace_prefix = prefix;
            }
        }
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
