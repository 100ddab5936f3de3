//! Cache abstraction and the key namespace shared by cache consumers.

use crate::core::history::ValuationPoint;
use crate::core::price::Timeframe;
use crate::core::snapshot::WalletSnapshot;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Wallet balances move less often than prices, so snapshots live longer.
pub const WALLET_TTL: Duration = Duration::from_secs(30 * 60);

/// Key-value store with per-entry expiry.
///
/// Expiry is the only eviction mechanism: there is no capacity limit and no
/// background sweep. Stale entries are dropped when a `get` finds them.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Returns the value if present and unexpired, evicting it otherwise.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value` until `now + ttl` (or the cache default when `None`),
    /// replacing any existing entry.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);

    async fn remove(&self, key: &K);

    async fn clear(&self);
}

/// Values the viewer keeps in its single shared cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedItem {
    Wallet(WalletSnapshot),
    History(CachedHistory),
}

/// A valuation series together with the balance it was valued at.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedHistory {
    pub balance: String,
    pub series: Arc<Vec<ValuationPoint>>,
}

pub type SharedCache = Arc<dyn Cache<String, CachedItem>>;

/// `wallet-{chainId}-{address}`
pub fn wallet_key(chain_id: &str, address: &str) -> String {
    format!("wallet-{chain_id}-{address}")
}

/// `{priceFeedId}-{timeframe}`
pub fn history_key(price_feed_id: &str, timeframe: Timeframe) -> String {
    format!("{price_feed_id}-{timeframe}")
}
