//! Wallet valuation, history and metrics

pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod history;
pub mod log;
pub mod metrics;
pub mod price;
pub mod snapshot;
pub mod viewer;

// Re-export main types for cleaner imports
pub use cache::{Cache, CachedItem, SharedCache};
pub use chain::{BalanceProvider, ChainDescriptor, ChainRegistry};
pub use error::WalletError;
pub use history::ValuationPoint;
pub use metrics::PortfolioMetrics;
pub use price::{PriceFeed, PricePoint, Timeframe};
pub use snapshot::WalletSnapshot;
pub use viewer::{HistoryOutcome, WalletReport, WalletViewer};
