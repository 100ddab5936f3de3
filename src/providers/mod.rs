pub mod blockchain_info;
pub mod coingecko;
pub mod etherscan;
pub mod util;

use crate::core::chain::{ChainDescriptor, ChainRegistry};
use crate::core::config::ProvidersConfig;
use blockchain_info::BlockchainInfoProvider;
use etherscan::{EtherscanProvider, WEI_DECIMALS};
use std::sync::Arc;

/// ERC-20 contract of the Render Network token on Ethereum mainnet.
pub const RNDR_CONTRACT: &str = "0x6de037ef9ad2725eb40118bb1702ebb27e4aeb24";

/// Builds the registry of supported chains against the configured endpoints.
pub fn supported_chains(config: &ProvidersConfig) -> ChainRegistry {
    let etherscan = &config.etherscan;
    let bscscan = &config.bscscan;

    ChainRegistry::new(vec![
        ChainDescriptor::new(
            "btc",
            "Bitcoin",
            "bitcoin",
            Arc::new(BlockchainInfoProvider::new(&config.blockchain_info.base_url)),
        ),
        ChainDescriptor::new(
            "eth",
            "Ethereum",
            "ethereum",
            Arc::new(EtherscanProvider::native(
                &etherscan.base_url,
                &etherscan.api_key,
                "Ethereum",
            )),
        ),
        ChainDescriptor::new(
            "rndr",
            "Render Network",
            "render-token",
            Arc::new(EtherscanProvider::token(
                &etherscan.base_url,
                &etherscan.api_key,
                RNDR_CONTRACT,
                WEI_DECIMALS,
                "Render Network",
            )),
        ),
        ChainDescriptor::new(
            "bnb",
            "Binance Coin",
            "binancecoin",
            Arc::new(EtherscanProvider::native(
                &bscscan.base_url,
                &bscscan.api_key,
                "Binance Coin",
            )),
        ),
    ])
}
