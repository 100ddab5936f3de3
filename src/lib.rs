pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::cache::SharedCache;
use crate::core::config::AppConfig;
use crate::core::price::Timeframe;
use crate::core::viewer::WalletViewer;
use crate::providers::coingecko::CoinGeckoProvider;
use crate::store::memory::MemoryCache;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Chains,
    View {
        chain: String,
        address: String,
        timeframe: Option<Timeframe>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Wallet viewer starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let chains = providers::supported_chains(&config.providers);

    match command {
        AppCommand::Chains => {
            println!("{}", cli::chains::display_chains(&chains));
            Ok(())
        }
        AppCommand::View {
            chain,
            address,
            timeframe,
        } => {
            let cache: SharedCache =
                Arc::new(MemoryCache::with_default_ttl(config.cache.default_ttl()));
            let price_feed = Arc::new(CoinGeckoProvider::new(&config.providers.coingecko.base_url));
            let viewer = WalletViewer::new(chains, price_feed, cache)
                .with_wallet_ttl(config.cache.wallet_ttl());

            let timeframe = timeframe.unwrap_or(config.timeframe);
            let result = cli::view::run(&viewer, &chain, &address, timeframe).await;
            viewer.shutdown().await;
            result
        }
    }
}
