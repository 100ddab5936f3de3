//! Historical valuation: turns a raw price series and a fixed balance into a
//! dated fiat series, off the caller's task.
//!
//! Jobs are handed to a dedicated background task over a channel. Each
//! dispatch gets a sequence number; a result whose number is older than the
//! most recent dispatch is reported as superseded so callers never render a
//! previous selection's series.

use crate::core::error::WalletError;
use crate::core::price::{PricePoint, Timeframe};
use crate::core::snapshot::parse_amount;
use chrono::DateTime;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One price sample converted to a fiat amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub date: String,
    pub timestamp_ms: i64,
    pub fiat_value: Decimal,
}

const DAY_FORMAT: &str = "%Y-%m-%d";
const INTRADAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Values every price point at `balance`, rounding to cents.
///
/// Output has the same length and order as `prices`. Any malformed input
/// fails the whole call; no partial series is returned.
pub fn transform(
    prices: &[PricePoint],
    balance: &str,
    timeframe: Timeframe,
) -> Result<Vec<ValuationPoint>, WalletError> {
    let balance = parse_amount(balance)
        .map_err(|_| WalletError::invalid_input(format!("Invalid input data: balance {balance}")))?;
    let format = if timeframe.is_intraday() {
        INTRADAY_FORMAT
    } else {
        DAY_FORMAT
    };

    prices
        .iter()
        .map(|point| {
            let unit_price = Decimal::from_f64(point.unit_price).ok_or_else(|| {
                WalletError::invalid_input(format!("Invalid price data: {}", point.unit_price))
            })?;
            let date = DateTime::from_timestamp_millis(point.timestamp_ms).ok_or_else(|| {
                WalletError::invalid_input(format!("Invalid timestamp: {}", point.timestamp_ms))
            })?;
            let value = unit_price
                .checked_mul(balance)
                .ok_or_else(|| WalletError::invalid_input("Valuation overflow"))?
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            Ok(ValuationPoint {
                date: date.format(format).to_string(),
                timestamp_ms: point.timestamp_ms,
                fiat_value: value,
            })
        })
        .collect()
}

/// Payload handed to the background task.
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub prices: Vec<PricePoint>,
    pub balance: String,
    pub timeframe: Timeframe,
}

type TransformResult = Result<Vec<ValuationPoint>, WalletError>;

struct Envelope {
    seq: u64,
    job: TransformJob,
    reply: oneshot::Sender<TransformResult>,
}

/// How a dispatched transform ended, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    Completed(Vec<ValuationPoint>),
    Failed(WalletError),
    /// A newer job was dispatched before this one was collected.
    Superseded,
}

/// Handle to an in-flight transform.
pub struct PendingTransform {
    seq: u64,
    latest: Arc<AtomicU64>,
    reply: oneshot::Receiver<TransformResult>,
}

impl PendingTransform {
    pub async fn wait(self) -> TransformOutcome {
        let result = match self.reply.await {
            Ok(result) => result,
            Err(_) => Err(WalletError::invalid_input("History worker stopped")),
        };

        let latest = self.latest.load(Ordering::SeqCst);
        if self.seq != latest {
            debug!(seq = self.seq, latest, "Discarding stale transform result");
            return TransformOutcome::Superseded;
        }
        match result {
            Ok(series) => TransformOutcome::Completed(series),
            Err(e) => TransformOutcome::Failed(e),
        }
    }
}

/// Background task dedicated to history transforms.
///
/// Must be created inside a tokio runtime. Dropping the worker aborts the
/// task; `shutdown` lets queued jobs finish first.
pub struct HistoryWorker {
    sender: Option<mpsc::UnboundedSender<Envelope>>,
    latest: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl HistoryWorker {
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(receiver));
        Self {
            sender: Some(sender),
            latest: Arc::new(AtomicU64::new(0)),
            handle: Some(handle),
        }
    }

    /// Queues `job`, making it the newest dispatch.
    pub fn dispatch(&self, job: TransformJob) -> Result<PendingTransform, WalletError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| WalletError::invalid_input("History worker stopped"))?;
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let (reply, receiver) = oneshot::channel();

        debug!(seq, points = job.prices.len(), "Dispatching history transform");
        sender
            .send(Envelope { seq, job, reply })
            .map_err(|_| WalletError::invalid_input("History worker stopped"))?;

        Ok(PendingTransform {
            seq,
            latest: Arc::clone(&self.latest),
            reply: receiver,
        })
    }

    pub async fn shutdown(mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "History worker ended abnormally");
            }
        }
    }
}

impl Drop for HistoryWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(Envelope { seq, job, reply }) = receiver.recv().await {
        let result = tokio::task::spawn_blocking(move || {
            transform(&job.prices, &job.balance, job.timeframe)
        })
        .await
        .unwrap_or_else(|e| {
            Err(WalletError::invalid_input(format!(
                "History transform aborted: {e}"
            )))
        });

        match &result {
            Ok(series) => debug!(seq, points = series.len(), "History transform done"),
            Err(e) => warn!(seq, error = %e, "History transform failed"),
        }
        if reply.send(result).is_err() {
            debug!(seq, "Transform result dropped, caller went away");
        }
    }
    debug!("History worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(raw: &[(i64, f64)]) -> Vec<PricePoint> {
        raw.iter().map(|(ts, p)| PricePoint::new(*ts, *p)).collect()
    }

    #[test]
    fn test_transform_values_each_point() {
        let prices = points(&[(0, 100.0), (86_400_000, 110.0)]);
        let series = transform(&prices, "2", Timeframe::SevenDays).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].fiat_value, Decimal::new(20000, 2));
        assert_eq!(series[1].fiat_value, Decimal::new(22000, 2));
        assert_eq!(series[0].date, "1970-01-01");
        assert_eq!(series[1].date, "1970-01-02");
        assert_eq!(series[1].timestamp_ms, 86_400_000);
    }

    #[test]
    fn test_transform_rounds_to_two_places() {
        let prices = points(&[(0, 0.333), (1, 1.0 / 3.0), (2, 12.345)]);
        let series = transform(&prices, "1.5", Timeframe::ThirtyDays).unwrap();

        // 0.4995 -> 0.50, 0.5 -> 0.50, 18.5175 -> 18.52
        assert_eq!(series[0].fiat_value, Decimal::new(50, 2));
        assert_eq!(series[1].fiat_value, Decimal::new(50, 2));
        assert_eq!(series[2].fiat_value, Decimal::new(1852, 2));
    }

    #[test]
    fn test_transform_intraday_dates_include_time() {
        let prices = points(&[(1_700_000_000_000, 1.0)]);
        let series = transform(&prices, "1", Timeframe::OneDay).unwrap();
        assert_eq!(series[0].date, "2023-11-14 22:13");
    }

    #[test]
    fn test_transform_empty_series() {
        let series = transform(&[], "3", Timeframe::SevenDays).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_transform_rejects_non_numeric_balance() {
        let prices = points(&[(0, 100.0)]);
        let err = transform(&prices, "lots", Timeframe::SevenDays).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));
    }

    #[test]
    fn test_transform_fails_whole_series_on_bad_price() {
        let prices = points(&[(0, 100.0), (1, f64::NAN), (2, 100.0)]);
        let err = transform(&prices, "1", Timeframe::SevenDays).unwrap_err();
        assert_eq!(err, WalletError::invalid_input("Invalid price data: NaN"));
    }

    #[tokio::test]
    async fn test_worker_round_trip() {
        let worker = HistoryWorker::spawn();
        let pending = worker
            .dispatch(TransformJob {
                prices: points(&[(0, 100.0), (86_400_000, 110.0)]),
                balance: "2".to_string(),
                timeframe: Timeframe::SevenDays,
            })
            .unwrap();

        match pending.wait().await {
            TransformOutcome::Completed(series) => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[1].fiat_value, Decimal::from(220));
            }
            other => panic!("Expected completed series, got {other:?}"),
        }
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_reports_errors_as_messages() {
        let worker = HistoryWorker::spawn();
        let pending = worker
            .dispatch(TransformJob {
                prices: points(&[(0, f64::INFINITY)]),
                balance: "2".to_string(),
                timeframe: Timeframe::SevenDays,
            })
            .unwrap();

        assert!(matches!(
            pending.wait().await,
            TransformOutcome::Failed(WalletError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_worker_last_dispatch_wins() {
        let worker = HistoryWorker::spawn();
        let job = TransformJob {
            prices: points(&[(0, 1.0)]),
            balance: "1".to_string(),
            timeframe: Timeframe::SevenDays,
        };

        let first = worker.dispatch(job.clone()).unwrap();
        let second = worker.dispatch(job).unwrap();

        assert_eq!(first.wait().await, TransformOutcome::Superseded);
        assert!(matches!(
            second.wait().await,
            TransformOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn test_dropped_worker_fails_pending_jobs() {
        let worker = HistoryWorker::spawn();
        let pending = worker
            .dispatch(TransformJob {
                prices: points(&[(0, 1.0)]),
                balance: "1".to_string(),
                timeframe: Timeframe::SevenDays,
            })
            .unwrap();
        drop(worker);

        // Either the job finished before the abort or the reply channel closed.
        match pending.wait().await {
            TransformOutcome::Completed(series) => assert_eq!(series.len(), 1),
            TransformOutcome::Failed(e) => {
                assert_eq!(e, WalletError::invalid_input("History worker stopped"))
            }
            TransformOutcome::Superseded => panic!("Only one job was dispatched"),
        }
    }
}
