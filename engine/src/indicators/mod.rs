// Technical indicators module
pub mod bollinger;
pub mod crossover;
pub mod rsi;
pub mod sma;
pub mod trend;
pub mod volume;

pub use bollinger::{bollinger_bands, BollingerBands, RollingStd};
pub use crossover::{moving_average_crossover, Crossover, Position};
pub use rsi::Rsi;
pub use sma::Sma;
pub use trend::determine_trend;
pub use volume::{check_volume_spike, VOLUME_WINDOW};

use serde_json::Value;
use shared::models::Candle;

use crate::config::IndicatorSettings;
use crate::data::CandleSeries;
use crate::error::EngineError;

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    /// One value per candle; `None` where the lookback window is not yet full.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>>;
}

/// Applies `f` to every full window of `values`. A window holding any `None` yields `None`.
pub fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 || window > values.len() {
        return vec![None; values.len()];
    }
    let mut buf = Vec::with_capacity(window.min(values.len()));
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            buf.clear();
            for v in &values[i + 1 - window..=i] {
                buf.push((*v)?);
            }
            Some(f(&buf))
        })
        .collect()
}

pub fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation (n - 1 denominator); undefined for a single value.
pub fn sample_std(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return f64::NAN;
    }
    let m = mean(window);
    let var = window.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (window.len() - 1) as f64;
    var.sqrt()
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    rolling(&values, window, mean)
}

/// Every indicator the composer reads for one pair, aligned 1:1 with the candle series.
#[derive(Debug, Clone)]
pub struct IndicatorBundle {
    pub crossover: Crossover,
    pub rsi: Vec<Option<f64>>,
    pub bands: BollingerBands,
    pub volume_spike: bool,
}

impl IndicatorBundle {
    /// Fails only on the volume-spike precondition (fewer than 50 candles).
    pub fn compute(series: &CandleSeries, settings: &IndicatorSettings) -> Result<Self, EngineError> {
        let candles = series.candles();
        let rsi = Rsi::new(settings.rsi_window);
        let bundle = IndicatorBundle {
            crossover: moving_average_crossover(candles, settings.short_ma_window, settings.long_ma_window),
            rsi: rsi.calculate(candles),
            bands: bollinger_bands(candles, settings.bollinger_window, settings.bollinger_std_dev),
            volume_spike: check_volume_spike(candles, settings.volume_spike_threshold)?,
        };
        tracing::debug!(
            pair = %series.pair(),
            rsi = %rsi.parameters(),
            position = ?bundle.latest_position(),
            latest_rsi = ?bundle.latest_rsi(),
            volume_spike = bundle.volume_spike,
            "Computed indicators"
        );
        Ok(bundle)
    }

    pub fn latest_position(&self) -> Option<Position> {
        self.crossover.positions.last().copied().flatten()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().copied().flatten()
    }

    /// (lower, upper) for the latest candle.
    pub fn latest_bands(&self) -> Option<(f64, f64)> {
        let lower = self.bands.lower.last().copied().flatten()?;
        let upper = self.bands.upper.last().copied().flatten()?;
        Some((lower, upper))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn create_candle(i: usize, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000 + i as i64 * 900_000).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    pub(crate) fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes.iter().enumerate().map(|(i, &c)| create_candle(i, c, 100.0)).collect()
    }

    #[test]
    fn test_rolling_mean_leaves_warmup_undefined() {
        let result = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(result, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_rolling_skips_windows_with_gaps() {
        let values = [None, Some(1.0), Some(3.0), Some(5.0)];
        assert_eq!(rolling(&values, 2, mean), vec![None, None, Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_window_longer_than_data() {
        let values = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(rolling(&values, 4, mean), vec![None; 3]);
        assert_eq!(rolling(&values, 1 << 62, mean), vec![None; 3]);
        assert_eq!(rolling_mean(&[], usize::MAX), Vec::<Option<f64>>::new());
    }

    #[test]
    fn test_sample_std() {
        assert!((sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.138089935).abs() < 1e-9);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_bundle_requires_volume_history() {
        let series = CandleSeries::new("BTC/USDT", shared::models::TimeFrame::Minute15, candles_from_closes(&[1.0; 49]));
        let result = IndicatorBundle::compute(&series, &IndicatorSettings::default());
        assert!(matches!(result, Err(EngineError::InsufficientData { required: 50, available: 49 })));
    }

    #[test]
    fn test_bundle_latest_values() {
        let closes: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let series = CandleSeries::new("ETH/USDT", shared::models::TimeFrame::Minute15, candles_from_closes(&closes));
        let bundle = IndicatorBundle::compute(&series, &IndicatorSettings::default()).unwrap();
        assert_eq!(bundle.latest_position(), None);
        assert!((bundle.latest_rsi().unwrap() - 50.0).abs() < 1e-6);
        let (lower, upper) = bundle.latest_bands().unwrap();
        assert!(lower < 101.0 && 101.0 < upper);
        assert!(!bundle.volume_spike);
    }
}
