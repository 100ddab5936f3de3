//! Portfolio metrics derived from a valuation series.
use crate::core::history::ValuationPoint;
use rust_decimal::Decimal;
use serde::Serialize;

const DAILY_MIN_POINTS: usize = 2;
const WEEKLY_MIN_POINTS: usize = 8;
const MONTHLY_MIN_POINTS: usize = 31;

/// Aggregate figures for the currently loaded series.
///
/// A change is `None` when the series is too short for its horizon or the
/// reference value is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub total_value: Option<Decimal>,
    pub daily_change_pct: Option<Decimal>,
    pub weekly_change_pct: Option<Decimal>,
    pub monthly_change_pct: Option<Decimal>,
}

impl PortfolioMetrics {
    /// Derives metrics for a single-asset series.
    ///
    /// The monthly change compares against the first point of the series,
    /// not the point 30 samples back.
    pub fn derive(series: &[ValuationPoint]) -> Self {
        let Some(last) = series.last() else {
            return Self::default();
        };
        let n = series.len();
        let change_from = |min_points: usize, reference: usize| {
            (n >= min_points)
                .then(|| percent_change(series[reference].fiat_value, last.fiat_value))
                .flatten()
        };

        Self {
            total_value: Some(last.fiat_value),
            daily_change_pct: change_from(DAILY_MIN_POINTS, n.saturating_sub(2)),
            weekly_change_pct: change_from(WEEKLY_MIN_POINTS, n.saturating_sub(8)),
            monthly_change_pct: change_from(MONTHLY_MIN_POINTS, 0),
        }
    }
}

fn percent_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from.is_zero() {
        return None;
    }
    (to - from)
        .checked_div(from)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
}
