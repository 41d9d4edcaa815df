// Relative Strength Index (RSI) indicator implementation
use super::{mean, rolling, IndicatorCalculator};
use serde_json::Value;
use shared::models::Candle;

/// Keeps RS finite when the window holds no losses.
pub const RSI_EPSILON: f64 = 1e-10;
pub const OVERSOLD: f64 = 30.0;
pub const OVERBOUGHT: f64 = 70.0;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "oversold": OVERSOLD, "overbought": OVERBOUGHT })
    }

    // Simple rolling averages of gains and losses, not Wilder's smoothing.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        // The first candle has no previous close; it counts as neither gain nor loss.
        let deltas: Vec<f64> = (0..data.len())
            .map(|i| if i == 0 { 0.0 } else { data[i].close - data[i - 1].close })
            .collect();
        let gains: Vec<Option<f64>> = deltas.iter().map(|d| Some(d.max(0.0))).collect();
        let losses: Vec<Option<f64>> = deltas.iter().map(|d| Some((-d).max(0.0))).collect();

        let avg_gain = rolling(&gains, self.period, mean);
        let avg_loss = rolling(&losses, self.period, mean);

        avg_gain
            .iter()
            .zip(avg_loss.iter())
            .map(|(gain, loss)| {
                let rs = (*gain)? / ((*loss)? + RSI_EPSILON);
                Some(100.0 - 100.0 / (1.0 + rs))
            })
            .collect()
    }
}
