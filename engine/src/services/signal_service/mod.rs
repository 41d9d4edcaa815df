// engine/src/services/signal_service/mod.rs
// Runs fetch -> indicators -> compose for every configured pair and sends one combined message.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use shared::models::TradeSignal;
use std::sync::Arc;

use super::notifier::{Delivery, Notifier};
use crate::config::SignalSettings;
use crate::data::{CandleSeries, MarketDataFetcher, OhlcvSource};
use crate::error::EngineError;
use crate::indicators::{determine_trend, IndicatorBundle};

pub mod compose_signal;
pub mod helpers;

pub use compose_signal::SignalComposer;

/// Separator between per-pair blocks in the combined message.
pub const SIGNAL_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Sent { signals: usize, delivery: Delivery },
    NoSignals,
    InvalidConfig,
}

pub struct SignalAggregator {
    settings: SignalSettings,
    source: Arc<dyn OhlcvSource>,
    notifier: Notifier,
    fetcher: MarketDataFetcher,
}

impl SignalAggregator {
    pub fn new(settings: SignalSettings, source: Arc<dyn OhlcvSource>, notifier: Notifier) -> Self {
        let fetcher = MarketDataFetcher {
            lookback: settings.lookback(),
            retries: settings.retry.fetch_retries,
            retry_delay: settings.retry.fetch_delay(),
            ..MarketDataFetcher::default()
        };
        SignalAggregator {
            settings,
            source,
            notifier,
            fetcher,
        }
    }

    /// One full pass. Callers must not start a second run while one is in flight.
    pub async fn run(&self) -> RunOutcome {
        tracing::info!("Checking trading pairs signals...");
        let signals = match self.collect_signals(Utc::now()).await {
            Ok(signals) => signals,
            Err(e) => {
                tracing::error!(error = %e, "Configuration is missing required keys, skipping run");
                return RunOutcome::InvalidConfig;
            }
        };

        if signals.is_empty() {
            tracing::info!("No signals generated.");
            return RunOutcome::NoSignals;
        }

        let summary = combine_signals(&signals);
        tracing::info!(signals = signals.len(), "Sending signal summary");
        let delivery = self.notifier.send(&summary).await;
        RunOutcome::Sent {
            signals: signals.len(),
            delivery,
        }
    }

    /// Fetches every pair concurrently and composes signals in pair order. Only a
    /// configuration problem is an error; per-pair failures are logged and skipped.
    pub async fn collect_signals(&self, generated_at: DateTime<Utc>) -> Result<Vec<TradeSignal>, EngineError> {
        let composer = SignalComposer::from_settings(&self.settings)?;
        let pairs = &self.settings.trading_pairs;

        let handles = pairs.iter().map(|pair| {
            let source = Arc::clone(&self.source);
            let fetcher = self.fetcher.clone();
            let pair = pair.clone();
            tokio::spawn(async move { fetcher.fetch(&*source, &pair).await })
        });
        let results = join_all(handles).await;

        let mut signals = Vec::new();
        for (pair, result) in pairs.iter().zip(results) {
            let series = match result {
                Ok(Some(series)) if !series.is_empty() => series,
                Ok(_) => {
                    tracing::warn!(pair = %pair, "No market data, skipping pair");
                    continue;
                }
                Err(e) => {
                    tracing::error!(pair = %pair, error = %e, "Market data task failed");
                    continue;
                }
            };

            tracing::info!(pair = %pair, timeframe = %series.timeframe(), rows = series.len(), "Processing data for trading pair");
            match self.process_pair(&composer, &series, generated_at) {
                Ok(Some(signal)) => {
                    tracing::info!(pair = %pair, sections = signal.sections.len(), "Generated signal");
                    signals.push(signal);
                }
                Ok(None) => tracing::debug!(pair = %pair, "No indicator crossed a threshold"),
                Err(e) => tracing::error!(pair = %pair, error = %e, "Error processing pair"),
            }
        }
        Ok(signals)
    }

    fn process_pair(
        &self,
        composer: &SignalComposer,
        series: &CandleSeries,
        generated_at: DateTime<Utc>,
    ) -> Result<Option<TradeSignal>, EngineError> {
        let windows = &self.settings.indicators;
        let bundle = IndicatorBundle::compute(series, windows)?;
        let trend_1h = determine_trend(series.candles(), windows.trend_1h_short_window, windows.trend_1h_long_window);
        let trend_15m = determine_trend(series.candles(), windows.trend_15m_short_window, windows.trend_15m_long_window);
        Ok(composer.compose(series, &bundle, trend_1h, trend_15m, generated_at))
    }
}

pub fn combine_signals(signals: &[TradeSignal]) -> String {
    signals
        .iter()
        .map(|signal| signal.to_string())
        .collect::<Vec<_>>()
        .join(SIGNAL_SEPARATOR)
}
