use crate::core::error::WalletError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Balance and fiat valuation of one address at lookup time.
///
/// Never mutated; a later lookup for the same address produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: String,
    pub balance: String,
    pub fiat_value: String,
}

impl WalletSnapshot {
    /// Values `balance` at `unit_price`, rounding the fiat amount to cents.
    pub fn value(address: &str, balance: String, unit_price: Decimal) -> Result<Self, WalletError> {
        let amount = parse_amount(&balance)?;
        let fiat = amount.checked_mul(unit_price).ok_or_else(|| {
            WalletError::invalid_input(format!("Valuation overflow: {balance} x {unit_price}"))
        })?;
        let fiat = fiat.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Ok(Self {
            address: address.to_string(),
            balance,
            fiat_value: format!("{fiat:.2}"),
        })
    }
}

pub(crate) fn parse_amount(s: &str) -> Result<Decimal, WalletError> {
    Decimal::from_str(s).map_err(|e| WalletError::invalid_input(format!("Not a number: {s} ({e})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_valuation() {
        let snapshot =
            WalletSnapshot::value("1abc", "1.50000000".to_string(), Decimal::from(2000)).unwrap();
        assert_eq!(snapshot.address, "1abc");
        assert_eq!(snapshot.balance, "1.50000000");
        assert_eq!(snapshot.fiat_value, "3000.00");
    }

    #[test]
    fn test_snapshot_rounds_to_cents() {
        let snapshot = WalletSnapshot::value(
            "0xabc",
            "0.123456789012345678".to_string(),
            Decimal::new(345678, 2),
        )
        .unwrap();
        // 0.123456789012345678 * 3456.78 = 426.7629...
        assert_eq!(snapshot.fiat_value, "426.76");
        assert_eq!(
            Decimal::from_str(&snapshot.fiat_value).unwrap(),
            Decimal::new(42676, 2)
        );
    }

    #[test]
    fn test_snapshot_rejects_non_numeric_balance() {
        let err = WalletSnapshot::value("a", "abc".to_string(), Decimal::ONE).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));
    }
}
