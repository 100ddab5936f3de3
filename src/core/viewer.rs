//! Wallet lookup orchestration.
//!
//! A lookup validates the selection, serves the snapshot from cache or
//! fetches balance then spot price, and finally loads the valuation history
//! through the background transform. Each lookup bumps a generation counter;
//! only the newest generation may update the visible view state.

use crate::core::cache::{
    CachedHistory, CachedItem, SharedCache, WALLET_TTL, history_key, wallet_key,
};
use crate::core::chain::{ChainDescriptor, ChainRegistry};
use crate::core::error::WalletError;
use crate::core::history::{HistoryWorker, TransformJob, TransformOutcome, ValuationPoint};
use crate::core::metrics::PortfolioMetrics;
use crate::core::price::{PriceFeed, Timeframe};
use crate::core::snapshot::WalletSnapshot;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    Fetching,
    Success(WalletSnapshot),
    Failed(WalletError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Loaded {
        series: Arc<Vec<ValuationPoint>>,
        from_cache: bool,
    },
    Failed(WalletError),
    /// A newer history request replaced this one before it finished.
    Superseded,
}

impl HistoryOutcome {
    pub fn series(&self) -> Option<&[ValuationPoint]> {
        match self {
            HistoryOutcome::Loaded { series, .. } => Some(series.as_slice()),
            _ => None,
        }
    }
}

/// Result of one orchestrated lookup.
#[derive(Debug, Clone)]
pub struct WalletReport {
    pub chain_symbol: String,
    pub chain_name: String,
    pub timeframe: Timeframe,
    pub snapshot: WalletSnapshot,
    pub snapshot_from_cache: bool,
    pub history: HistoryOutcome,
    pub metrics: PortfolioMetrics,
}

struct ViewState {
    generation: u64,
    chain: Option<ChainDescriptor>,
    timeframe: Timeframe,
    lookup: LookupState,
    history: Arc<Vec<ValuationPoint>>,
}

pub struct WalletViewer {
    chains: ChainRegistry,
    price_feed: Arc<dyn PriceFeed>,
    cache: SharedCache,
    worker: HistoryWorker,
    wallet_ttl: Duration,
    generation: AtomicU64,
    view: Mutex<ViewState>,
}

impl WalletViewer {
    /// Must be called inside a tokio runtime; spawns the history worker.
    pub fn new(chains: ChainRegistry, price_feed: Arc<dyn PriceFeed>, cache: SharedCache) -> Self {
        Self {
            chains,
            price_feed,
            cache,
            worker: HistoryWorker::spawn(),
            wallet_ttl: WALLET_TTL,
            generation: AtomicU64::new(0),
            view: Mutex::new(ViewState {
                generation: 0,
                chain: None,
                timeframe: Timeframe::default(),
                lookup: LookupState::Idle,
                history: Arc::new(Vec::new()),
            }),
        }
    }

    pub fn with_wallet_ttl(mut self, ttl: Duration) -> Self {
        self.wallet_ttl = ttl;
        self
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    pub async fn state(&self) -> LookupState {
        self.view.lock().await.lookup.clone()
    }

    /// Series of the most recent lookup; empty while it is in flight.
    pub async fn history(&self) -> Arc<Vec<ValuationPoint>> {
        Arc::clone(&self.view.lock().await.history)
    }

    pub async fn metrics(&self) -> PortfolioMetrics {
        PortfolioMetrics::derive(&self.history().await)
    }

    /// Looks up `address` on the chain with symbol `chain_id`.
    ///
    /// Errors from the snapshot phase are returned unchanged. History
    /// failures are reported inside the returned report and leave the
    /// snapshot valid.
    #[instrument(name = "WalletLookup", skip(self))]
    pub async fn lookup(
        &self,
        chain_id: Option<&str>,
        address: &str,
        timeframe: Timeframe,
    ) -> Result<WalletReport, WalletError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let chain = match self.validate(chain_id, address) {
            Ok(chain) => chain.clone(),
            Err(e) => {
                self.begin(generation, None, timeframe).await;
                self.finish(generation, LookupState::Failed(e.clone())).await;
                return Err(e);
            }
        };
        self.begin(generation, Some(chain.clone()), timeframe).await;

        let (snapshot, snapshot_from_cache) = match self.fetch_snapshot(&chain, address).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Wallet lookup failed");
                self.finish(generation, LookupState::Failed(e.clone())).await;
                return Err(e);
            }
        };
        self.finish(generation, LookupState::Success(snapshot.clone()))
            .await;

        let history = self
            .load_history(generation, &chain, &snapshot.balance, timeframe)
            .await;
        let metrics = history
            .series()
            .map(PortfolioMetrics::derive)
            .unwrap_or_default();

        Ok(WalletReport {
            chain_symbol: chain.symbol.clone(),
            chain_name: chain.display_name.clone(),
            timeframe,
            snapshot,
            snapshot_from_cache,
            history,
            metrics,
        })
    }

    /// Reloads history for the current snapshot in another timeframe.
    pub async fn select_timeframe(&self, timeframe: Timeframe) -> Result<HistoryOutcome, WalletError> {
        let (generation, chain, balance) = {
            let mut view = self.view.lock().await;
            let (chain, snapshot) = match (&view.chain, &view.lookup) {
                (Some(chain), LookupState::Success(snapshot)) => (chain.clone(), snapshot.clone()),
                _ => {
                    return Err(WalletError::validation(
                        "No wallet loaded, run a lookup first",
                    ));
                }
            };
            view.timeframe = timeframe;
            (view.generation, chain, snapshot.balance)
        };

        Ok(self
            .load_history(generation, &chain, &balance, timeframe)
            .await)
    }

    /// Stops the history worker after in-flight transforms finish.
    pub async fn shutdown(self) {
        self.worker.shutdown().await;
    }

    fn validate(&self, chain_id: Option<&str>, address: &str) -> Result<&ChainDescriptor, WalletError> {
        let chain_id = chain_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| WalletError::validation("Select a cryptocurrency"))?;
        if address.trim().is_empty() {
            return Err(WalletError::validation("Enter an address"));
        }
        self.chains
            .get(chain_id)
            .ok_or_else(|| WalletError::validation(format!("Unsupported chain: {chain_id}")))
    }

    async fn begin(&self, generation: u64, chain: Option<ChainDescriptor>, timeframe: Timeframe) {
        let mut view = self.view.lock().await;
        if generation < view.generation {
            return;
        }
        view.generation = generation;
        view.chain = chain;
        view.timeframe = timeframe;
        view.lookup = LookupState::Fetching;
        view.history = Arc::new(Vec::new());
    }

    async fn finish(&self, generation: u64, state: LookupState) {
        let mut view = self.view.lock().await;
        if view.generation != generation {
            debug!(generation, current = view.generation, "Discarding stale lookup result");
            return;
        }
        view.lookup = state;
    }

    async fn fetch_snapshot(
        &self,
        chain: &ChainDescriptor,
        address: &str,
    ) -> Result<(WalletSnapshot, bool), WalletError> {
        let key = wallet_key(&chain.symbol, address);
        if let Some(CachedItem::Wallet(snapshot)) = self.cache.get(&key).await {
            info!("Using cached wallet data");
            return Ok((snapshot, true));
        }

        info!(address, "Fetching {} balance", chain.display_name);
        let balance = chain.balance_fetcher.fetch_balance(address).await?;
        debug!(%balance, "Balance fetched");

        let unit_price = self.price_feed.fetch_spot_price(&chain.price_feed_id).await?;
        debug!(%unit_price, "Spot price fetched");

        let snapshot = WalletSnapshot::value(address, balance, unit_price)?;
        self.cache
            .put(key, CachedItem::Wallet(snapshot.clone()), Some(self.wallet_ttl))
            .await;
        Ok((snapshot, false))
    }

    async fn load_history(
        &self,
        generation: u64,
        chain: &ChainDescriptor,
        balance: &str,
        timeframe: Timeframe,
    ) -> HistoryOutcome {
        let key = history_key(&chain.price_feed_id, timeframe);
        if let Some(CachedItem::History(cached)) = self.cache.get(&key).await {
            if cached.balance == balance {
                info!(%timeframe, "Using cached historical data");
                self.show_history(generation, timeframe, &cached.series).await;
                return HistoryOutcome::Loaded {
                    series: cached.series,
                    from_cache: true,
                };
            }
            debug!(%timeframe, "Cached history was valued at another balance");
        }

        let (from, to) = timeframe.window(Utc::now());
        info!(%timeframe, %from, %to, "Fetching historical data for {}", chain.price_feed_id);
        let prices = match self
            .price_feed
            .fetch_price_history(&chain.price_feed_id, from, to)
            .await
        {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, "Historical data fetch failed");
                return HistoryOutcome::Failed(e);
            }
        };

        // Only the current lookup and timeframe dispatch; the worker's newest
        // job is always the one on screen.
        let dispatched = {
            let view = self.view.lock().await;
            if view.generation != generation || view.timeframe != timeframe {
                debug!(generation, %timeframe, "Lookup no longer current, skipping transform");
                return HistoryOutcome::Superseded;
            }
            self.worker.dispatch(TransformJob {
                prices,
                balance: balance.to_string(),
                timeframe,
            })
        };
        let pending = match dispatched {
            Ok(pending) => pending,
            Err(e) => return HistoryOutcome::Failed(e),
        };

        match pending.wait().await {
            TransformOutcome::Completed(series) => {
                let series = Arc::new(series);
                self.cache
                    .put(
                        key,
                        CachedItem::History(CachedHistory {
                            balance: balance.to_string(),
                            series: Arc::clone(&series),
                        }),
                        None,
                    )
                    .await;
                self.show_history(generation, timeframe, &series).await;
                HistoryOutcome::Loaded {
                    series,
                    from_cache: false,
                }
            }
            TransformOutcome::Failed(e) => HistoryOutcome::Failed(e),
            TransformOutcome::Superseded => HistoryOutcome::Superseded,
        }
    }

    async fn show_history(
        &self,
        generation: u64,
        timeframe: Timeframe,
        series: &Arc<Vec<ValuationPoint>>,
    ) {
        let mut view = self.view.lock().await;
        if view.generation == generation && view.timeframe == timeframe {
            view.history = Arc::clone(series);
        }
    }
}
