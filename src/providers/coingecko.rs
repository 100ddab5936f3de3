use super::util::{build_url, get_json, http_client};
use crate::core::error::WalletError;
use crate::core::price::{PriceFeed, PricePoint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Fiat unit every price is quoted in.
pub const VS_CURRENCY: &str = "usd";

/// Spot and historical USD prices from the CoinGecko API.
pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    prices: Option<Vec<(f64, f64)>>,
}

#[async_trait]
impl PriceFeed for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoSpotFetch", skip(self))]
    async fn fetch_spot_price(&self, feed_id: &str) -> Result<Decimal, WalletError> {
        let url = build_url(
            &format!("{}/simple/price", self.base_url),
            &[("ids", feed_id), ("vs_currencies", VS_CURRENCY)],
        )?;
        let data: HashMap<String, HashMap<String, f64>> =
            get_json(&self.client, url, &format!("USD price for {feed_id}")).await?;

        let price = data
            .get(feed_id)
            .and_then(|quotes| quotes.get(VS_CURRENCY))
            .copied()
            .ok_or_else(|| WalletError::provider(format!("No USD price found for {feed_id}")))?;
        debug!(price, "Spot price received");

        Decimal::from_f64(price)
            .ok_or_else(|| WalletError::provider(format!("Invalid USD price for {feed_id}: {price}")))
    }

    #[instrument(name = "CoinGeckoHistoryFetch", skip(self))]
    async fn fetch_price_history(
        &self,
        feed_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, WalletError> {
        let from = from.timestamp().to_string();
        let to = to.timestamp().to_string();
        let url = build_url(
            &format!("{}/coins/{}/market_chart/range", self.base_url, feed_id),
            &[("vs_currency", VS_CURRENCY), ("from", from.as_str()), ("to", to.as_str())],
        )?;
        let data: MarketChartResponse =
            get_json(&self.client, url, &format!("price history for {feed_id}")).await?;

        let prices = data
            .prices
            .filter(|prices| !prices.is_empty())
            .ok_or_else(|| WalletError::provider("Invalid or empty price data received"))?;
        debug!(points = prices.len(), "Price history received");

        Ok(prices
            .into_iter()
            .map(|(timestamp_ms, unit_price)| PricePoint::new(timestamp_ms as i64, unit_price))
            .collect())
    }
}
