use super::util::{build_url, get_json, http_client};
use crate::core::chain::{BalanceProvider, scale_native_amount};
use crate::core::error::WalletError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

pub const WEI_DECIMALS: u32 = 18;

/// Balances from an Etherscan-compatible explorer API (Etherscan, BscScan).
///
/// Without a contract address the native coin balance is requested,
/// otherwise the ERC-20 token balance for that contract.
pub struct EtherscanProvider {
    base_url: String,
    api_key: String,
    contract_address: Option<String>,
    decimals: u32,
    label: String,
    client: reqwest::Client,
}

impl EtherscanProvider {
    pub fn native(base_url: &str, api_key: &str, label: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            contract_address: None,
            decimals: WEI_DECIMALS,
            label: label.to_string(),
            client: http_client(),
        }
    }

    pub fn token(
        base_url: &str,
        api_key: &str,
        contract_address: &str,
        decimals: u32,
        label: &str,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            contract_address: Some(contract_address.to_string()),
            decimals,
            label: label.to_string(),
            client: http_client(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ExplorerResponse {
    status: String,
    message: Option<String>,
    result: Option<serde_json::Value>,
}

#[async_trait]
impl BalanceProvider for EtherscanProvider {
    #[instrument(name = "ExplorerBalanceFetch", skip(self), fields(chain = %self.label))]
    async fn fetch_balance(&self, address: &str) -> Result<String, WalletError> {
        let mut params = vec![("module", "account")];
        match &self.contract_address {
            Some(contract) => {
                params.push(("action", "tokenbalance"));
                params.push(("contractaddress", contract.as_str()));
            }
            None => params.push(("action", "balance")),
        }
        params.extend([
            ("address", address),
            ("tag", "latest"),
            ("apikey", self.api_key.as_str()),
        ]);

        let url = build_url(&self.base_url, &params)?;
        let context = format!("{} balance", self.label);
        let data: ExplorerResponse = get_json(&self.client, url, &context).await?;

        let result = data.result.as_ref().and_then(|r| r.as_str());
        if data.status != "1" {
            let message = data
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Failed to fetch {} data", self.label));
            return Err(WalletError::provider(match result {
                Some(detail) if !detail.is_empty() && detail != message => {
                    format!("{message}: {detail}")
                }
                _ => message,
            }));
        }

        let raw = result
            .ok_or_else(|| WalletError::provider(format!("{context} response has no result")))?
            .parse::<i128>()
            .map_err(|e| WalletError::provider(format!("Invalid {context} result: {e}")))?;

        let balance = scale_native_amount(raw, self.decimals)?;
        debug!(%balance, "{} balance fetched", self.label);
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "0xde0B295669a9FD93d5F28D9Ec85E40f4cb697BAe";
    const CONTRACT: &str = "0x6de037ef9ad2725eb40118bb1702ebb27e4aeb24";

    #[tokio::test]
    async fn test_native_balance() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("module", "account"))
            .and(query_param("action", "balance"))
            .and(query_param("address", ADDRESS))
            .and(query_param("tag", "latest"))
            .and(query_param("apikey", "KEY"))
            .and(query_param_is_missing("contractaddress"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "1", "message": "OK", "result": "1500000000000000000"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            EtherscanProvider::native(&format!("{}/api", mock_server.uri()), "KEY", "Ethereum");
        let balance = provider.fetch_balance(ADDRESS).await.unwrap();
        assert_eq!(balance, "1.500000000000000000");
    }

    #[tokio::test]
    async fn test_token_balance_sends_contract() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "tokenbalance"))
            .and(query_param("contractaddress", CONTRACT))
            .and(query_param("address", ADDRESS))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "1", "message": "OK", "result": "250000000000000000000"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = EtherscanProvider::token(
            &format!("{}/api", mock_server.uri()),
            "KEY",
            CONTRACT,
            WEI_DECIMALS,
            "Render Network",
        );
        let balance = provider.fetch_balance(ADDRESS).await.unwrap();
        assert_eq!(balance, "250.000000000000000000");
    }

    #[tokio::test]
    async fn test_status_not_one_is_provider_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "0", "message": "NOTOK", "result": "Invalid API Key"}"#,
            ))
            .mount(&mock_server)
            .await;

        let provider =
            EtherscanProvider::native(&format!("{}/api", mock_server.uri()), "BAD", "Ethereum");
        let err = provider.fetch_balance(ADDRESS).await.unwrap_err();
        assert_eq!(err, WalletError::provider("NOTOK: Invalid API Key"));
    }

    #[tokio::test]
    async fn test_status_not_one_without_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "0"}"#))
            .mount(&mock_server)
            .await;

        let provider =
            EtherscanProvider::native(&format!("{}/api", mock_server.uri()), "KEY", "Binance Coin");
        let err = provider.fetch_balance(ADDRESS).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::provider("Failed to fetch Binance Coin data")
        );
    }

    #[tokio::test]
    async fn test_non_numeric_result_is_provider_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "1", "message": "OK", "result": "lots"}"#,
            ))
            .mount(&mock_server)
            .await;

        let provider =
            EtherscanProvider::native(&format!("{}/api", mock_server.uri()), "KEY", "Ethereum");
        let err = provider.fetch_balance(ADDRESS).await.unwrap_err();
        assert!(matches!(err, WalletError::Provider(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider =
            EtherscanProvider::native(&format!("{}/api", mock_server.uri()), "KEY", "Ethereum");
        let err = provider.fetch_balance(ADDRESS).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::Network {
                status: 503,
                context: "Ethereum balance".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Nothing listens on port 9 on localhost in the test environment
        let provider = EtherscanProvider::native("http://127.0.0.1:9/api", "KEY", "Ethereum");
        let err = provider.fetch_balance(ADDRESS).await.unwrap_err();
        assert!(matches!(err, WalletError::Transport(_)));
    }
}
