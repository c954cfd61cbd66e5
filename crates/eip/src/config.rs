//! Service configuration (TOML-serializable).
//!
//! ```toml
//! cluster_name = "prod-eu"
//!
//! [additional_tags]
//! team = "platform"
//!
//! [network.elastic_ip_pool]
//! public_ipv4_pool = "ipv4pool-ec2-0123"
//! fallback_order = "none"
//!
//! [retry]
//! initial_delay_ms = 500
//! steps = 10
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_primitives::{FallbackOrder, PoolId, Tags};
use tether_wait::Backoff;
use thiserror::Error;

/// Upper bounds for the retry schedule.
const MAX_RETRY_FACTOR: f64 = 10.0;
const MAX_RETRY_JITTER: f64 = 1.0;
const MAX_INITIAL_DELAY_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EipConfig {
    /// Cluster identity every address is tagged and filtered with.
    pub cluster_name: String,

    /// Extra tags applied to every allocated address.
    #[serde(default)]
    pub additional_tags: Tags,

    #[serde(default)]
    pub network: NetworkSpec,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl EipConfig {
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            additional_tags: Tags::new(),
            network: NetworkSpec::default(),
            retry: RetryConfig::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_name.trim().is_empty() {
            return Err(ConfigError::Invalid("cluster_name must not be empty".into()));
        }
        if let Some(pool) = self.network.public_ipv4_pool() {
            if pool.as_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "network.elastic_ip_pool.public_ipv4_pool must not be empty".into(),
                ));
            }
        }
        if !(1.0..=MAX_RETRY_FACTOR).contains(&self.retry.factor) {
            return Err(ConfigError::Invalid(format!(
                "retry.factor must be within 1..={MAX_RETRY_FACTOR}, got {}",
                self.retry.factor
            )));
        }
        if !(0.0..=MAX_RETRY_JITTER).contains(&self.retry.jitter) {
            return Err(ConfigError::Invalid(format!(
                "retry.jitter must be within 0..={MAX_RETRY_JITTER}, got {}",
                self.retry.jitter
            )));
        }
        if self.retry.initial_delay_ms > MAX_INITIAL_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "retry.initial_delay_ms must be at most {MAX_INITIAL_DELAY_MS}, got {}",
                self.retry.initial_delay_ms
            )));
        }
        Ok(())
    }

    pub fn with_pool(mut self, pool: impl Into<PoolId>, fallback_order: Option<FallbackOrder>) -> Self {
        self.network.elastic_ip_pool = Some(ElasticIpPool {
            public_ipv4_pool: Some(pool.into()),
            fallback_order,
        });
        self
    }
}

/// Virtual network settings relevant to address allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    #[serde(default)]
    pub elastic_ip_pool: Option<ElasticIpPool>,
}

impl NetworkSpec {
    /// Configured bring-your-own pool, if any.
    pub fn public_ipv4_pool(&self) -> Option<&PoolId> {
        self.elastic_ip_pool
            .as_ref()
            .and_then(|p| p.public_ipv4_pool.as_ref())
    }

    /// Unset means fallback to the provider pool is allowed.
    pub fn fallback_order(&self) -> FallbackOrder {
        self.elastic_ip_pool
            .as_ref()
            .and_then(|p| p.fallback_order)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticIpPool {
    #[serde(default)]
    pub public_ipv4_pool: Option<PoolId>,

    #[serde(default)]
    pub fallback_order: Option<FallbackOrder>,
}

/// Retry schedule for disassociate and release calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_factor")]
    pub factor: f64,

    #[serde(default = "default_jitter")]
    pub jitter: f64,

    #[serde(default = "default_steps")]
    pub steps: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            factor: default_factor(),
            jitter: default_jitter(),
            steps: default_steps(),
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial: Duration::from_millis(self.initial_delay_ms),
            factor: self.factor,
            jitter: self.jitter,
            steps: self.steps,
            cap: None,
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_factor() -> f64 {
    1.5
}

fn default_jitter() -> f64 {
    0.4
}

fn default_steps() -> u32 {
    10
}
