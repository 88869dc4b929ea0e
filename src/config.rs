use serde::{Deserialize, Serialize};
use crate::error::UptimeError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UptimeConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub uptime: UptimeSettings,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChainConfig {
    /// CometBFT RPC endpoint (`/status`, `/block`)
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Cosmos SDK REST endpoint (`/cosmos/staking/...`)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_bond_status")]
    pub bond_status: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UptimeSettings {
    #[serde(default = "default_window_size")]
    pub window_size: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rpc_url() -> String {
    "https://lumera-testnet-rpc.polkachu.com".to_string()
}

fn default_api_url() -> String {
    "https://lumera-testnet-api.polkachu.com".to_string()
}

fn default_bond_status() -> String {
    "BOND_STATUS_BONDED".to_string()
}

fn default_window_size() -> u64 {
    30
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            api_url: default_api_url(),
            bond_status: default_bond_status(),
        }
    }
}

impl Default for UptimeSettings {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            refresh_interval_secs: default_refresh_interval(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            uptime: UptimeSettings::default(),
            http: HttpConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl UptimeConfig {
    /// `Ok(None)` when there is no file at `path`.
    pub fn load(path: &str) -> Result<Option<Self>, UptimeError> {
        if !std::path::Path::new(path).exists() {
            return Ok(None);
        }
        let s = std::fs::read_to_string(path)
            .map_err(|e| UptimeError::Config(format!("Error reading {}: {}", path, e)))?;
        Self::from_toml(&s).map(Some)
    }

    pub fn from_toml(s: &str) -> Result<Self, UptimeError> {
        toml::from_str(s).map_err(|e| UptimeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), UptimeError> {
        if self.uptime.window_size == 0 {
            return Err(UptimeError::Config("window_size must be at least 1".to_string()));
        }
        if self.uptime.max_concurrent_fetches == 0 {
            return Err(UptimeError::Config(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if self.chain.rpc_url.trim().is_empty() || self.chain.api_url.trim().is_empty() {
            return Err(UptimeError::Config("rpc_url and api_url must be set".to_string()));
        }
        Ok(())
    }
}
