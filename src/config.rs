// src/config.rs
//! Agent settings.
//!
//! Loaded from an optional `registry.toml` and then `REGISTRY_*` environment
//! variables (nested keys separated by `__`). A `.env` file is honoured.
//!
//! ## Keys
//! - `wallet_type`: wallet backend name; its absence is reported in
//!   "no ledger" errors since it is the usual misconfiguration
//! - `tails_server_base_url`: base URL revocation tails files are served from
//! - `log_level`: default `env_logger` filter when `RUST_LOG` is unset
//! - `ledgers`: pools (`id`, `url`, `namespaces`, `is_write`, `timeout_secs`)

use serde::Deserialize;
use std::sync::Arc;

use crate::ledger::http_client::{HttpLedger, HttpLedgerConfig};
use crate::ledger::{LedgerError, LedgerPool, LedgerPools};

pub const DEFAULT_CONFIG_FILE: &str = "registry";
pub const ENV_PREFIX: &str = "REGISTRY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// One ledger pool entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LedgerSettings {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub is_write: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub wallet_type: Option<String>,
    #[serde(default)]
    pub tails_server_base_url: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub ledgers: Vec<LedgerSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wallet_type: None,
            tails_server_base_url: None,
            log_level: default_log_level(),
            ledgers: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads `.env`, then `registry.{toml,json,yaml}` if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads from the named config file (extension optional) and the environment.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Builds the HTTP ledger pools described by `ledgers`.
    pub fn ledger_pools(&self) -> Result<LedgerPools, LedgerError> {
        self.ledgers.iter().try_fold(LedgerPools::new(), |pools, entry| {
            let ledger = HttpLedger::new(HttpLedgerConfig {
                base_url: entry.url.clone(),
                timeout_secs: entry.timeout_secs,
            })?;
            Ok(pools.with_pool(LedgerPool {
                id: entry.id.clone(),
                namespaces: entry.namespaces.clone(),
                is_write: entry.is_write,
                ledger: Arc::new(ledger),
            }))
        })
    }
}
