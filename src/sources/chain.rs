//! On-chain reads against a Uniswap V2 pair contract.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::abis::IUniswapV2Pair;

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw pair state read in one sampling pass.
///
/// Reserves are the pair's raw integer token amounts (uint112 on chain);
/// supply and balance are raw share units.
#[derive(Debug, Clone)]
pub struct PoolState {
    pub reserve0: u128,
    pub reserve1: u128,
    pub block_timestamp_last: u32,
    pub total_supply: U256,
    pub user_balance: U256,
}

/// Read access to the latest confirmed state of a pair contract.
///
/// No transaction submission happens anywhere behind this trait.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_pool_state(&self, pool_address: &str) -> Result<PoolState>;
}

pub struct RpcChainSource {
    provider: DynProvider,
    user: Address,
}

impl RpcChainSource {
    pub fn new(rpc_url: &str, user: Address) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;

        let client = ProviderBuilder::new().connect_http(url);
        let provider = DynProvider::new(client);

        Ok(Self { provider, user })
    }

    /// Latest confirmed block number; used once at startup to verify
    /// connectivity before the first round.
    pub async fn latest_block_number(&self) -> Result<u64> {
        let number = tokio::time::timeout(RPC_CALL_TIMEOUT, self.provider.get_block_number())
            .await
            .context("Block number query timed out")?
            .context("Block number query failed")?;

        Ok(number)
    }
}

#[async_trait]
impl ChainSource for RpcChainSource {
    async fn fetch_pool_state(&self, pool_address: &str) -> Result<PoolState> {
        let address: Address = pool_address
            .parse()
            .context("Invalid pair contract address")?;

        let pair = IUniswapV2Pair::new(address, &self.provider);

        let reserves = tokio::time::timeout(RPC_CALL_TIMEOUT, pair.getReserves().call())
            .await
            .context("getReserves timed out")?
            .context("getReserves failed")?;

        let total_supply = tokio::time::timeout(RPC_CALL_TIMEOUT, pair.totalSupply().call())
            .await
            .context("totalSupply timed out")?
            .context("totalSupply failed")?;

        let user_balance = tokio::time::timeout(RPC_CALL_TIMEOUT, pair.balanceOf(self.user).call())
            .await
            .context("balanceOf timed out")?
            .context("balanceOf failed")?;

        Ok(PoolState {
            reserve0: reserves.reserve0.to::<u128>(),
            reserve1: reserves.reserve1.to::<u128>(),
            block_timestamp_last: reserves.blockTimestampLast,
            total_supply,
            user_balance,
        })
    }
}
