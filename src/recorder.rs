//! One sampling cycle per pool: gate, fetch, compute, persist.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};

use crate::config::PoolSettings;
use crate::errors::CycleError;
use crate::sources::{ChainSource, PriceSource};
use crate::store::{HistoryStore, Snapshot};
use crate::utils::{reserve_to_f64, u256_ratio};

/// Produces exactly one new snapshot per invocation, or cleanly defers.
///
/// Collaborators are injected as trait objects so cycles can run against
/// substitute sources in tests.
pub struct Recorder {
    store: HistoryStore,
    prices: Arc<dyn PriceSource>,
    chain: Arc<dyn ChainSource>,
    interval_secs: i64,
}

impl Recorder {
    pub fn new(
        store: HistoryStore,
        prices: Arc<dyn PriceSource>,
        chain: Arc<dyn ChainSource>,
        interval_secs: u64,
    ) -> Self {
        Self {
            store,
            prices,
            chain,
            interval_secs: interval_secs as i64,
        }
    }

    /// Run one sampling cycle for `pool`.
    ///
    /// If the last saved snapshot is closer than the configured interval,
    /// sleeps once for the remaining seconds and re-reads the clock before
    /// fetching. Any failure aborts the cycle before the pool's file is
    /// touched.
    pub async fn run_cycle(
        &self,
        pool: &PoolSettings,
        now: i64,
    ) -> Result<Snapshot, CycleError> {
        info!("Started sampling cycle pool={}", pool.name);

        let mut history = self.store.load_history(&pool.name);
        let mut now = now;

        let wait = HistoryStore::seconds_until_next_allowed(&history, now, self.interval_secs);
        if wait > 0 {
            warn!(
                "Too close to the last recorded snapshot pool={} seconds_to_sleep={}",
                pool.name, wait
            );
            tokio::time::sleep(Duration::from_secs(wait as u64)).await;
            now = Utc::now().timestamp();
        }

        let ids = vec![pool.token0.price_id.clone(), pool.token1.price_id.clone()];
        let quotes = self
            .prices
            .usd_prices(&ids)
            .await
            .map_err(|e| CycleError::PriceFetch(format!("{e:#}")))?;

        let token0_price = *quotes.get(&pool.token0.price_id).ok_or_else(|| {
            CycleError::PriceFetch(format!("no usd quote for {}", pool.token0.price_id))
        })?;
        let token1_price = *quotes.get(&pool.token1.price_id).ok_or_else(|| {
            CycleError::PriceFetch(format!("no usd quote for {}", pool.token1.price_id))
        })?;

        info!(
            "Fetched prices pool={} {}_usd={} {}_usd={}",
            pool.name, pool.token0.symbol, token0_price, pool.token1.symbol, token1_price
        );

        let state = self
            .chain
            .fetch_pool_state(&pool.address)
            .await
            .map_err(|e| CycleError::ChainQuery(format!("{e:#}")))?;

        let reserve0 = reserve_to_f64(state.reserve0, pool.token0.decimals);
        let reserve1 = reserve_to_f64(state.reserve1, pool.token1.decimals);

        info!(
            "Fetched reserves pool={} reserve0={} reserve1={}",
            pool.name, reserve0, reserve1
        );

        if state.total_supply.is_zero() {
            return Err(CycleError::DivisionByZero);
        }

        let user_fraction = u256_ratio(state.user_balance, state.total_supply)
            .ok_or_else(|| CycleError::ChainQuery("share ratio is not representable".to_string()))?;

        info!(
            "Fetched user share pool={} user_share={} total_supply={} user_share_pct={:.2}%",
            pool.name,
            state.user_balance,
            state.total_supply,
            user_fraction * 100.0
        );

        let token0_balance = reserve0 * user_fraction;
        // TODO: confirm whether token1Balance should come from reserve1;
        // recorded histories have always derived both columns from reserve0.
        let token1_balance = reserve0 * user_fraction;

        let snapshot = Snapshot {
            timestamp: now,
            token0_balance,
            token1_balance,
            token0_price,
            token1_price,
        };

        self.store
            .append_and_persist(&pool.name, &mut history, snapshot.clone())?;

        info!(
            "Pool history saved pool={} rows={} timestamp={}",
            pool.name,
            history.len(),
            now
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use alloy::primitives::U256;
    use anyhow::Result;
    use async_trait::async_trait;

    use crate::config::TokenSettings;
    use crate::sources::PoolState;

    struct StaticPrices(HashMap<String, f64>);

    #[async_trait]
    impl PriceSource for StaticPrices {
        async fn usd_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
            Ok(ids
                .iter()
                .filter_map(|id| self.0.get(id).map(|p| (id.clone(), *p)))
                .collect())
        }
    }

    struct StaticChain(PoolState);

    #[async_trait]
    impl ChainSource for StaticChain {
        async fn fetch_pool_state(&self, _pool_address: &str) -> Result<PoolState> {
            Ok(self.0.clone())
        }
    }

    fn rune_eth_pool() -> PoolSettings {
        PoolSettings {
            name: "RUNE-ETH".to_string(),
            address: "0xcc39592f5cB193a70f262aA301f54DB1d600e6Da".to_string(),
            token0: TokenSettings {
                price_id: "thorchain".to_string(),
                symbol: "RUNE".to_string(),
                decimals: 18,
            },
            token1: TokenSettings {
                price_id: "ethereum".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
        }
    }

    fn example_prices() -> HashMap<String, f64> {
        HashMap::from([("thorchain".to_string(), 1.23), ("ethereum".to_string(), 2500.0)])
    }

    fn example_state() -> PoolState {
        PoolState {
            reserve0: 5_000_000_000_000_000_000_000u128,
            reserve1: 2_000_000_000_000_000_000_000u128,
            block_timestamp_last: 0,
            total_supply: U256::from(1000u64),
            user_balance: U256::from(10u64),
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("poolwatch-rec-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn make_recorder(dir: &PathBuf, prices: HashMap<String, f64>, state: PoolState) -> Recorder {
        Recorder::new(
            HistoryStore::new(dir.clone()),
            Arc::new(StaticPrices(prices)),
            Arc::new(StaticChain(state)),
            3600,
        )
    }

    #[tokio::test]
    async fn test_end_to_end_example_cycle() {
        let dir = temp_dir("e2e");
        let recorder = make_recorder(&dir, example_prices(), example_state());

        let snapshot = recorder
            .run_cycle(&rune_eth_pool(), 1_700_000_000)
            .await
            .unwrap();

        assert_eq!(snapshot.timestamp, 1_700_000_000);
        assert_eq!(snapshot.token0_balance, 50.0);
        assert_eq!(snapshot.token1_balance, 50.0);
        assert_eq!(snapshot.token0_price, 1.23);
        assert_eq!(snapshot.token1_price, 2500.0);

        let reloaded = HistoryStore::new(dir).load_history("RUNE-ETH");
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.last().unwrap(), &snapshot);
    }

    #[tokio::test]
    async fn test_cycle_appends_after_full_interval() {
        let dir = temp_dir("append");
        let recorder = make_recorder(&dir, example_prices(), example_state());
        let pool = rune_eth_pool();

        let first = recorder.run_cycle(&pool, 1_700_000_000).await.unwrap();
        let second = recorder.run_cycle(&pool, 1_700_003_600).await.unwrap();
        assert_eq!(second.timestamp - first.timestamp, 3600);

        let reloaded = HistoryStore::new(dir).load_history("RUNE-ETH");
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.last().unwrap().timestamp, 1_700_003_600);
    }

    #[tokio::test]
    async fn test_zero_supply_aborts_without_write() {
        let dir = temp_dir("zero-supply");
        let mut state = example_state();
        state.total_supply = U256::ZERO;
        let recorder = make_recorder(&dir, example_prices(), state);

        let err = recorder
            .run_cycle(&rune_eth_pool(), 1_700_000_000)
            .await
            .unwrap_err();

        assert!(matches!(err, CycleError::DivisionByZero));
        assert!(!dir.join("RUNE-ETH.csv").exists());
    }

    #[tokio::test]
    async fn test_missing_price_aborts_without_write() {
        let dir = temp_dir("missing-price");
        let mut prices = example_prices();
        prices.remove("ethereum");
        let recorder = make_recorder(&dir, prices, example_state());

        let err = recorder
            .run_cycle(&rune_eth_pool(), 1_700_000_000)
            .await
            .unwrap_err();

        assert!(matches!(err, CycleError::PriceFetch(_)));
        assert!(!dir.join("RUNE-ETH.csv").exists());
    }
}
