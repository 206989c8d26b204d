//! Spot price lookup against the CoinGecko simple-price endpoint.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Request timeout for price lookups (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of current USD prices for a set of oracle asset ids.
///
/// Ids the oracle does not know are absent from the returned map; the
/// caller decides whether that is fatal.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn usd_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>>;
}

/// One quote entry in a simple-price response: `{"usd": 1.23}`.
#[derive(Debug, Deserialize)]
struct PriceQuote {
    usd: f64,
}

pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: COINGECKO_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn usd_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
        let url = format!("{}/simple/price", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", "usd".to_string())])
            .send()
            .await
            .context("Price request failed")?
            .error_for_status()
            .context("Price request rejected")?;

        let quotes: HashMap<String, PriceQuote> = response
            .json()
            .await
            .context("Malformed price response")?;

        Ok(quotes.into_iter().map(|(id, q)| (id, q.usd)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_price_response_shape() {
        let body = r#"{"thorchain":{"usd":1.23},"ethereum":{"usd":2500.0}}"#;
        let quotes: HashMap<String, PriceQuote> = serde_json::from_str(body).unwrap();
        assert_eq!(quotes["thorchain"].usd, 1.23);
        assert_eq!(quotes["ethereum"].usd, 2500.0);
    }

    #[test]
    fn test_unknown_ids_are_simply_absent() {
        // CoinGecko drops unknown ids rather than erroring
        let body = r#"{"thorchain":{"usd":1.23}}"#;
        let quotes: HashMap<String, PriceQuote> = serde_json::from_str(body).unwrap();
        assert!(!quotes.contains_key("ethereum"));
    }
}
