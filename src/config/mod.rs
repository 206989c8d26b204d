mod config;

pub use config::{PoolSettings, RecorderSettings, RpcSettings, Settings, TokenSettings};
