//! Error taxonomy shared by balance providers, price feeds and the viewer.

use thiserror::Error;

/// Every failure a wallet lookup can surface. None of these are retried by
/// the core; the caller decides whether to resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Missing chain selection or address. No request was made.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The upstream answered with a non-success HTTP status.
    #[error("HTTP error: {status} for {context}")]
    Network { status: u16, context: String },
    /// The upstream answered 200 but reported a failure in the payload.
    #[error("Provider error: {0}")]
    Provider(String),
    /// Malformed data reached the history transform.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request never produced a status (connect, DNS, body read).
    #[error("Request error: {0}")]
    Transport(String),
}

impl WalletError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WalletError::Validation(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        WalletError::Provider(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        WalletError::InvalidInput(msg.into())
    }

    /// HTTP status carried by a `Network` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            WalletError::Network { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_carries_status() {
        let err = WalletError::Network {
            status: 500,
            context: "bitcoin balance".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP error: 500 for bitcoin balance");
        assert_eq!(WalletError::provider("NOTOK").status(), None);
    }
}
