use std::collections::HashSet;

use config::{Config, ConfigError, File};
use serde::Deserialize;

/// JSON-RPC endpoint configuration.
///
/// The endpoint credential (e.g. an Infura project id) is carried inside
/// the URL itself.
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    pub url: String,
}

/// Recorder configuration: whose position to track, where histories live
/// and how often a pool may be sampled.
#[derive(Debug, Deserialize, Clone)]
pub struct RecorderSettings {
    /// Address whose pool-share balance is sampled each cycle.
    pub user_address: String,
    /// Directory holding one CSV history file per pool name.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Minimum spacing between two snapshots of the same pool.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_interval_secs() -> u64 {
    3600 // 1 hour
}

/// One side of a monitored pair.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenSettings {
    /// Asset identifier on the price oracle (e.g. "thorchain").
    pub price_id: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A monitored Uniswap V2 pair.
///
/// `name` doubles as the history file name, so it must be unique across
/// the configured pools.
#[derive(Debug, Deserialize, Clone)]
pub struct PoolSettings {
    pub name: String,
    /// Pair contract address.
    pub address: String,
    pub token0: TokenSettings,
    pub token1: TokenSettings,
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc: RpcSettings,
    pub recorder: RecorderSettings,
    pub pools: Vec<PoolSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Invariants the rest of the system assumes: unique pool names (one
    /// history file per name) and distinct oracle ids within a pair.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for pool in &self.pools {
            if !names.insert(pool.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate pool name: {}",
                    pool.name
                )));
            }
            if pool.token0.price_id == pool.token1.price_id {
                return Err(ConfigError::Message(format!(
                    "pool {} uses the same price id for both tokens: {}",
                    pool.name, pool.token0.price_id
                )));
            }
        }
        Ok(())
    }
}
