//! Chain descriptors and the balance capability every chain supplies.

use crate::core::error::WalletError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Fetches the balance held by an address on one chain.
///
/// Implementations make one round trip per call, pass the address through
/// unvalidated, and return the amount as a fixed-precision decimal string
/// scaled to the chain's native decimal count.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn fetch_balance(&self, address: &str) -> Result<String, WalletError>;
}

/// Converts an integer amount in the chain's smallest unit into a decimal
/// string with exactly `decimals` fractional digits.
pub fn scale_native_amount(raw: i128, decimals: u32) -> Result<String, WalletError> {
    let amount = Decimal::try_from_i128_with_scale(raw, decimals)
        .map_err(|e| WalletError::provider(format!("Balance {raw} out of range: {e}")))?;
    Ok(amount.to_string())
}

/// Immutable description of a supported chain.
#[derive(Clone)]
pub struct ChainDescriptor {
    pub symbol: String,
    pub display_name: String,
    pub price_feed_id: String,
    pub balance_fetcher: Arc<dyn BalanceProvider>,
}

impl ChainDescriptor {
    pub fn new(
        symbol: &str,
        display_name: &str,
        price_feed_id: &str,
        balance_fetcher: Arc<dyn BalanceProvider>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            price_feed_id: price_feed_id.to_string(),
            balance_fetcher,
        }
    }
}

impl fmt::Debug for ChainDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainDescriptor")
            .field("symbol", &self.symbol)
            .field("display_name", &self.display_name)
            .field("price_feed_id", &self.price_feed_id)
            .finish_non_exhaustive()
    }
}

/// The set of chains known at startup.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainDescriptor>) -> Self {
        Self { chains }
    }

    /// Case-insensitive lookup by symbol.
    pub fn get(&self, symbol: &str) -> Option<&ChainDescriptor> {
        self.chains
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.iter()
    }
}
