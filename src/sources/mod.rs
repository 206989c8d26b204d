pub mod chain;
pub mod price;

pub use chain::{ChainSource, PoolState, RpcChainSource};
pub use price::{CoinGeckoClient, PriceSource};
