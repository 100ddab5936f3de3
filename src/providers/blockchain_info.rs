use super::util::{get_json, http_client};
use crate::core::chain::{BalanceProvider, scale_native_amount};
use crate::core::error::WalletError;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

const SATOSHI_DECIMALS: u32 = 8;

/// Bitcoin balances from the blockchain.info raw address endpoint.
pub struct BlockchainInfoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl BlockchainInfoProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawAddrResponse {
    final_balance: Option<i64>,
    error: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl BalanceProvider for BlockchainInfoProvider {
    #[instrument(name = "BitcoinBalanceFetch", skip(self))]
    async fn fetch_balance(&self, address: &str) -> Result<String, WalletError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| WalletError::Transport(format!("Invalid request URL {}: {e}", self.base_url)))?;
        // One escaped segment: the address never changes the path or query
        url.path_segments_mut()
            .map_err(|_| WalletError::Transport(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["rawaddr", address]);
        let data: RawAddrResponse = get_json(&self.client, url, "Bitcoin balance").await?;

        let satoshis = match data.final_balance {
            Some(satoshis) => satoshis,
            None => {
                return Err(WalletError::provider(
                    data.message
                        .or(data.error)
                        .unwrap_or_else(|| "Response does not contain final_balance".to_string()),
                ));
            }
        };

        let balance = scale_native_amount(satoshis.into(), SATOSHI_DECIMALS)?;
        debug!(%balance, "Bitcoin balance fetched");
        Ok(balance)
    }
}
