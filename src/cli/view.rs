use super::ui;
use crate::core::history::ValuationPoint;
use crate::core::metrics::PortfolioMetrics;
use crate::core::price::Timeframe;
use crate::core::viewer::{HistoryOutcome, WalletReport, WalletViewer};
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::debug;

/// Number of most recent valuation points shown in the history table.
const HISTORY_ROWS: usize = 10;

pub fn display_wallet(report: &WalletReport) -> String {
    let snapshot = &report.snapshot;
    let symbol = report.chain_symbol.to_uppercase();

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("Address"), Cell::new(&snapshot.address)]);
    table.add_row(vec![
        Cell::new("Balance"),
        ui::value_cell(&format!("{} {symbol}", snapshot.balance)),
    ]);
    table.add_row(vec![
        Cell::new("Value (USD)"),
        ui::value_cell(&format!("${}", snapshot.fiat_value)),
    ]);

    let source = if report.snapshot_from_cache {
        ui::style_text(" (cached)", ui::StyleType::Subtle)
    } else {
        String::new()
    };

    format!(
        "Wallet: {}{source}\n\n{table}",
        ui::style_text(&report.chain_name, ui::StyleType::Title)
    )
}

pub fn display_metrics(metrics: &PortfolioMetrics) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Total (USD)"),
        ui::header_cell("24h"),
        ui::header_cell("7d"),
        ui::header_cell("30d"),
    ]);

    let total = metrics
        .total_value
        .map_or_else(|| "N/A".to_string(), |v| format!("${v:.2}"));
    table.add_row(vec![
        ui::value_cell(&total),
        ui::change_cell(metrics.daily_change_pct),
        ui::change_cell(metrics.weekly_change_pct),
        ui::change_cell(metrics.monthly_change_pct),
    ]);

    format!(
        "{}\n\n{table}",
        ui::style_text("Performance", ui::StyleType::Title)
    )
}

pub fn display_history(history: &HistoryOutcome, timeframe: Timeframe) -> String {
    let title = ui::style_text(&format!("History ({timeframe})"), ui::StyleType::Title);

    match history {
        HistoryOutcome::Loaded { series, from_cache } => {
            let mut output = format!("{title}\n\n{}", history_summary(series));
            if *from_cache {
                output.push_str(&ui::style_text(" (cached)", ui::StyleType::Subtle));
            }
            if series.is_empty() {
                return output;
            }

            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Value (USD)")]);
            let skip = series.len().saturating_sub(HISTORY_ROWS);
            for point in series.iter().skip(skip) {
                table.add_row(vec![
                    Cell::new(&point.date),
                    ui::value_cell(&format!("${:.2}", point.fiat_value)),
                ]);
            }
            output.push_str(&format!("\n\n{table}"));
            output
        }
        HistoryOutcome::Failed(e) => format!(
            "{title}\n\n{}",
            ui::style_text(&format!("History unavailable: {e}"), ui::StyleType::Error)
        ),
        HistoryOutcome::Superseded => format!(
            "{title}\n\n{}",
            ui::style_text("History replaced by a newer request", ui::StyleType::Subtle)
        ),
    }
}

fn history_summary(series: &[ValuationPoint]) -> String {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => format!(
            "{} points, {} ${:.2} → {} ${:.2}",
            series.len(),
            first.date,
            first.fiat_value,
            last.date,
            last.fiat_value
        ),
        _ => "No data points".to_string(),
    }
}

/// Runs one lookup and prints the wallet, its metrics and its history.
pub async fn run(
    viewer: &WalletViewer,
    chain: &str,
    address: &str,
    timeframe: Timeframe,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {} wallet...", chain.to_uppercase()));
    let result = viewer.lookup(Some(chain), address, timeframe).await;
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            return Err(e).context("Wallet lookup failed");
        }
    };
    debug!(history = ?report.history.series().map(|s| s.len()), "Lookup finished");

    println!("{}", display_wallet(&report));
    ui::print_separator();
    println!("{}", display_metrics(&report.metrics));
    ui::print_separator();
    println!("{}", display_history(&report.history, report.timeframe));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::WalletError;
    use crate::core::snapshot::WalletSnapshot;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn point(date: &str, cents: i64) -> ValuationPoint {
        ValuationPoint {
            date: date.to_string(),
            timestamp_ms: 0,
            fiat_value: Decimal::new(cents, 2),
        }
    }

    fn report(history: HistoryOutcome) -> WalletReport {
        let metrics = history
            .series()
            .map(PortfolioMetrics::derive)
            .unwrap_or_default();
        WalletReport {
            chain_symbol: "eth".to_string(),
            chain_name: "Ethereum".to_string(),
            timeframe: Timeframe::SevenDays,
            snapshot: WalletSnapshot {
                address: "0xabc".to_string(),
                balance: "2.000000000000000000".to_string(),
                fiat_value: "4000.00".to_string(),
            },
            snapshot_from_cache: false,
            history,
            metrics,
        }
    }

    #[test]
    fn test_display_wallet() {
        let output = display_wallet(&report(HistoryOutcome::Superseded));
        assert!(output.contains("Ethereum"));
        assert!(output.contains("0xabc"));
        assert!(output.contains("2.000000000000000000 ETH"));
        assert!(output.contains("$4000.00"));
        assert!(!output.contains("cached"));
    }

    #[test]
    fn test_display_metrics_without_history_is_na() {
        let output = display_metrics(&PortfolioMetrics::default());
        assert_eq!(output.matches("N/A").count(), 4);
    }

    #[test]
    fn test_display_metrics_with_daily_change() {
        let series = vec![point("2024-03-01", 20000), point("2024-03-02", 22000)];
        let output = display_metrics(&PortfolioMetrics::derive(&series));
        assert!(output.contains("$220.00"));
        assert!(output.contains("10.00%"));
        assert_eq!(output.matches("N/A").count(), 2);
    }

    #[test]
    fn test_display_history_shows_latest_rows() {
        let series: Vec<ValuationPoint> = (1..=12)
            .map(|day| point(&format!("2024-03-{day:02}"), day * 100))
            .collect();
        let history = HistoryOutcome::Loaded {
            series: Arc::new(series),
            from_cache: false,
        };

        let output = display_history(&history, Timeframe::ThirtyDays);
        assert!(output.contains("History (30d)"));
        assert!(output.contains("12 points, 2024-03-01 $1.00 → 2024-03-12 $12.00"));
        assert!(output.contains("2024-03-03"));
        assert!(!output.contains("2024-03-02"));
    }

    #[test]
    fn test_display_history_failure() {
        let history = HistoryOutcome::Failed(WalletError::provider(
            "Invalid or empty price data received",
        ));
        let output = display_history(&history, Timeframe::OneDay);
        assert!(output.contains("History unavailable: Provider error: Invalid or empty price data received"));
    }
}
