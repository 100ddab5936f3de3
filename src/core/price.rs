//! Pricing abstractions and core types

use crate::core::error::WalletError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Historical window requested from the price history source.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum Timeframe {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Timeframe::OneDay => "1d",
                Timeframe::SevenDays => "7d",
                Timeframe::ThirtyDays => "30d",
            }
        )
    }
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [
        Timeframe::OneDay,
        Timeframe::SevenDays,
        Timeframe::ThirtyDays,
    ];

    pub fn to_duration(&self) -> Duration {
        match self {
            Timeframe::OneDay => Duration::days(1),
            Timeframe::SevenDays => Duration::days(7),
            Timeframe::ThirtyDays => Duration::days(30),
        }
    }

    /// `[start, end]` window ending at `end`.
    pub fn window(&self, end: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (end - self.to_duration(), end)
    }

    /// Whether points in this window are finer than a day.
    pub fn is_intraday(&self) -> bool {
        matches!(self, Timeframe::OneDay)
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" => Ok(Timeframe::OneDay),
            "7d" => Ok(Timeframe::SevenDays),
            "30d" => Ok(Timeframe::ThirtyDays),
            _ => Err(anyhow::anyhow!("Invalid timeframe: {}", s)),
        }
    }
}

/// A single raw sample from a historical price feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub unit_price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, unit_price: f64) -> Self {
        Self {
            timestamp_ms,
            unit_price,
        }
    }
}

/// Fiat price source. The fiat unit is fixed by the implementation.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current unit price of the asset identified by `feed_id`.
    async fn fetch_spot_price(&self, feed_id: &str) -> Result<Decimal, WalletError>;

    /// Price samples between `from` and `to`, ascending by timestamp.
    async fn fetch_price_history(
        &self,
        feed_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeframe_parse_and_display() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
        assert_eq!("7D".parse::<Timeframe>().unwrap(), Timeframe::SevenDays);
        assert!("1y".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_window() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let (start, stop) = Timeframe::ThirtyDays.window(end);
        assert_eq!(stop, end);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

        let (start, _) = Timeframe::OneDay.window(end);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap());
    }
}
