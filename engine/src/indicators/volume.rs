use super::rolling_mean;
use shared::models::Candle;

use crate::error::EngineError;

/// The volume baseline always spans 50 candles, whatever the other windows are set to.
pub const VOLUME_WINDOW: usize = 50;

/// True when the latest volume exceeds `threshold` times its 50-candle average.
/// Fewer than 50 candles is an error rather than a quiet `false`.
pub fn check_volume_spike(data: &[Candle], threshold: f64) -> Result<bool, EngineError> {
    if data.len() < VOLUME_WINDOW {
        return Err(EngineError::InsufficientData {
            required: VOLUME_WINDOW,
            available: data.len(),
        });
    }
    let volumes: Vec<f64> = data.iter().map(|c| c.volume).collect();
    let avg_volume = rolling_mean(&volumes, VOLUME_WINDOW)
        .last()
        .copied()
        .flatten()
        .ok_or_else(|| EngineError::IndicatorError("Rolling volume average is undefined".to_string()))?;
    let latest_volume = volumes[volumes.len() - 1];
    Ok(latest_volume > avg_volume * threshold)
}
