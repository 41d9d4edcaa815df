// Market data retrieval: the exchange-facing source trait, the validated candle series,
// and the retrying fetcher that sits between them.
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use shared::models::{Candle, TimeFrame};
use std::time::Duration;

use crate::error::EngineError;

/// One raw OHLCV row as handed out by an exchange: `[timestamp_ms, open, high, low, close, volume]`.
pub type OhlcvRow = Vec<f64>;

pub const OHLCV_FIELDS: usize = 6;

/// Abstract interface for an exchange's candle endpoint.
#[async_trait]
pub trait OhlcvSource: Send + Sync {
    async fn fetch_ohlcv(
        &self,
        pair: &str,
        timeframe: TimeFrame,
        since_ms: i64,
    ) -> Result<Vec<OhlcvRow>, EngineError>;

    fn iso8601(&self, ms: i64) -> Result<String, EngineError> {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .ok_or_else(|| EngineError::DataValidationError(format!("Invalid epoch milliseconds: {}", ms)))
    }

    fn parse8601(&self, text: &str) -> Result<i64, EngineError> {
        DateTime::parse_from_rfc3339(text)
            .map(|at| at.timestamp_millis())
            .map_err(|e| EngineError::DataValidationError(format!("Invalid ISO 8601 timestamp '{}': {}", text, e)))
    }
}

/// Candles for one pair, ascending by timestamp with no duplicate timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    pair: String,
    timeframe: TimeFrame,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(pair: &str, timeframe: TimeFrame, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        CandleSeries {
            pair: pair.to_string(),
            timeframe,
            candles,
        }
    }

    /// Builds a series from raw exchange rows. Anything but a non-empty list of
    /// six-field rows with finite values is a validation error.
    pub fn from_rows(pair: &str, timeframe: TimeFrame, rows: &[OhlcvRow]) -> Result<Self, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::DataValidationError(format!("No OHLCV rows returned for {}", pair)));
        }

        let mut candles = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != OHLCV_FIELDS {
                return Err(EngineError::DataValidationError(format!(
                    "Row {} for {} has {} fields, expected {}",
                    i,
                    pair,
                    row.len(),
                    OHLCV_FIELDS
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(EngineError::DataValidationError(format!("Row {} for {} contains a non-finite value", i, pair)));
            }
            let timestamp = DateTime::<Utc>::from_timestamp_millis(row[0] as i64).ok_or_else(|| {
                EngineError::DataValidationError(format!("Row {} for {} has an invalid timestamp {}", i, pair, row[0]))
            })?;
            candles.push(Candle {
                timestamp,
                open: row[1],
                high: row[2],
                low: row[3],
                close: row[4],
                volume: row[5],
            });
        }

        Ok(Self::new(pair, timeframe, candles))
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

/// Fetches a fixed-length recent window of candles for one pair, retrying with a fixed delay.
#[derive(Debug, Clone)]
pub struct MarketDataFetcher {
    pub lookback: chrono::Duration,
    pub timeframe: TimeFrame,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for MarketDataFetcher {
    fn default() -> Self {
        MarketDataFetcher {
            lookback: chrono::Duration::hours(24),
            timeframe: TimeFrame::Minute15,
            retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl MarketDataFetcher {
    /// Candles a complete lookback window holds at this timeframe.
    pub fn expected_rows(&self) -> usize {
        (self.lookback.num_milliseconds() / self.timeframe.duration_ms()).max(0) as usize
    }

    /// Returns `None` once every attempt has failed; never an error, so one pair's
    /// outage cannot take the rest of a run down with it.
    pub async fn fetch(&self, source: &dyn OhlcvSource, pair: &str) -> Option<CandleSeries> {
        for attempt in 1..=self.retries {
            match self.fetch_once(source, pair).await {
                Ok(series) => {
                    let expected = self.expected_rows();
                    if series.len() < expected {
                        tracing::warn!(pair = %pair, rows = series.len(), expected, "Exchange returned a partial window");
                    }
                    tracing::debug!(pair = %pair, attempt, rows = series.len(), "Fetched market data");
                    return Some(series);
                }
                Err(e) => {
                    tracing::error!(
                        pair = %pair,
                        attempt,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Error fetching market data"
                    );
                    if attempt < self.retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        tracing::error!(pair = %pair, attempts = self.retries, "Giving up on market data after all retries");
        None
    }

    async fn fetch_once(&self, source: &dyn OhlcvSource, pair: &str) -> Result<CandleSeries, EngineError> {
        let since = Utc::now() - self.lookback;
        // Normalise through the source's own timestamp format, as the exchange expects it.
        let since_ms = source.parse8601(&source.iso8601(since.timestamp_millis())?)?;
        let rows = source.fetch_ohlcv(pair, self.timeframe, since_ms).await?;
        CandleSeries::from_rows(pair, self.timeframe, &rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracing_test::traced_test;

    pub(crate) fn row(ts_ms: i64, close: f64, volume: f64) -> OhlcvRow {
        vec![ts_ms as f64, close, close, close, close, volume]
    }

    /// Replays a scripted sequence of responses, one per call.
    pub(crate) struct ScriptedSource {
        responses: Mutex<Vec<Result<Vec<OhlcvRow>, EngineError>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub(crate) fn new(mut responses: Vec<Result<Vec<OhlcvRow>, EngineError>>) -> Self {
            responses.reverse();
            ScriptedSource { responses: Mutex::new(responses), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl OhlcvSource for ScriptedSource {
        async fn fetch_ohlcv(&self, _pair: &str, _timeframe: TimeFrame, _since_ms: i64) -> Result<Vec<OhlcvRow>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(EngineError::DataValidationError("script exhausted".to_string())))
        }
    }

    fn fetcher() -> MarketDataFetcher {
        MarketDataFetcher {
            retry_delay: Duration::from_secs(5),
            ..MarketDataFetcher::default()
        }
    }

    #[test]
    fn test_from_rows_sorts_and_dedups() {
        let rows = vec![row(3_000, 3.0, 1.0), row(1_000, 1.0, 1.0), row(2_000, 2.0, 1.0), row(1_000, 9.0, 1.0)];
        let series = CandleSeries::from_rows("BTC/USDT", TimeFrame::Minute15, &rows).unwrap();
        assert_eq!(series.len(), 3);
        let closes: Vec<f64> = series.candles().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.latest().unwrap().timestamp.timestamp_millis(), 3_000);
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        let result = CandleSeries::from_rows("BTC/USDT", TimeFrame::Minute15, &[]);
        assert!(matches!(result, Err(EngineError::DataValidationError(_))));
    }

    #[test]
    fn test_from_rows_rejects_short_row() {
        let rows = vec![row(1_000, 1.0, 1.0), vec![2_000.0, 1.0, 1.0, 1.0, 1.0]];
        let result = CandleSeries::from_rows("BTC/USDT", TimeFrame::Minute15, &rows);
        assert!(matches!(result, Err(EngineError::DataValidationError(ref msg)) if msg.contains("5 fields")));
    }

    #[test]
    fn test_from_rows_rejects_nan() {
        let rows = vec![vec![1_000.0, 1.0, f64::NAN, 1.0, 1.0, 1.0]];
        let result = CandleSeries::from_rows("BTC/USDT", TimeFrame::Minute15, &rows);
        assert!(matches!(result, Err(EngineError::DataValidationError(_))));
    }

    #[test]
    fn test_iso8601_round_trip_defaults() {
        let source = ScriptedSource::new(vec![]);
        let text = source.iso8601(1_700_000_000_123).unwrap();
        assert_eq!(text, "2023-11-14T22:13:20.123Z");
        assert_eq!(source.parse8601(&text).unwrap(), 1_700_000_000_123);
        assert!(source.parse8601("yesterday").is_err());
    }

    #[test]
    fn test_expected_rows_for_lookback() {
        assert_eq!(fetcher().expected_rows(), 96);
        let hourly = MarketDataFetcher {
            lookback: chrono::Duration::hours(48),
            timeframe: TimeFrame::Hour1,
            ..MarketDataFetcher::default()
        };
        assert_eq!(hourly.expected_rows(), 48);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_fetch_gives_up_after_retries() {
        let source = ScriptedSource::new(vec![
            Ok(vec![]),
            Ok(vec![vec![1.0, 2.0]]),
            Err(EngineError::ExchangeError("rate limited".to_string())),
        ]);
        let fetcher = fetcher();
        let started = tokio::time::Instant::now();

        let result = fetcher.fetch(&source, "BTC/USDT").await;

        assert!(result.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        for attempt in 1..=3 {
            assert!(logs_contain(&format!("attempt={}", attempt)));
        }
        assert!(logs_contain("Giving up on market data after all retries"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_recovers_on_second_attempt() {
        let source = ScriptedSource::new(vec![
            Err(EngineError::ExchangeError("timeout".to_string())),
            Ok(vec![row(1_000, 1.0, 10.0), row(2_000, 2.0, 10.0)]),
        ]);
        let fetcher = fetcher();
        let started = tokio::time::Instant::now();

        let series = fetcher.fetch(&source, "ETH/USDT").await.unwrap();

        assert_eq!(series.pair(), "ETH/USDT");
        assert_eq!(series.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }
}
