use super::{IndicatorCalculator, Sma};
use shared::models::{Candle, Trend};

/// Compares the latest short and long SMA of the close. Equal averages, or either
/// average still warming up, read as `Neutral`.
pub fn determine_trend(data: &[Candle], short_window: usize, long_window: usize) -> Trend {
    let latest = |window: usize| Sma::new(window).calculate(data).last().copied().flatten();
    match (latest(short_window), latest(long_window)) {
        (Some(short), Some(long)) if short > long => Trend::Bullish,
        (Some(short), Some(long)) if short < long => Trend::Bearish,
        _ => Trend::Neutral,
    }
}
