use crate::core::error::WalletError;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

const USER_AGENT: &str = "walletview/0.1";

/// Client shared by every request a provider makes.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        })
}

/// Builds a URL from `base` and query parameters.
pub fn build_url(base: &str, params: &[(&str, &str)]) -> Result<Url, WalletError> {
    Url::parse_with_params(base, params)
        .map_err(|e| WalletError::Transport(format!("Invalid request URL {base}: {e}")))
}

/// Issues one GET and decodes the JSON body.
///
/// Non-success statuses become `WalletError::Network`; bodies that do not
/// decode become `WalletError::Provider`. `context` names the request in
/// errors and logs; the URL itself is not logged since it may carry an
/// API key.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    context: &str,
) -> Result<T, WalletError> {
    debug!(path = url.path(), "Requesting {}", context);

    let response = client.get(url).send().await?;

    let status = response.status();
    debug!(%status, "Received response for {}", context);
    if !status.is_success() {
        return Err(WalletError::Network {
            status: status.as_u16(),
            context: context.to_string(),
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!(error = ?e, response = %text, "Failed to parse {} response", context);
        WalletError::provider(format!("Failed to parse {context} response: {e}"))
    })
}
