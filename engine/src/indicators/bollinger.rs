// Bollinger Bands: rolling mean +/- k rolling standard deviations of the close.
use super::{rolling, rolling_mean, sample_std, IndicatorCalculator};
use serde_json::Value;
use shared::models::Candle;

/// Rolling sample standard deviation of the close.
pub struct RollingStd {
    name: String,
    period: usize,
}

impl RollingStd {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("STD({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for RollingStd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let closes: Vec<Option<f64>> = data.iter().map(|c| Some(c.close)).collect();
        rolling(&closes, self.period, sample_std)
            .into_iter()
            .map(|v| v.filter(|s| s.is_finite()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub rolling_mean: Vec<Option<f64>>,
    pub rolling_std: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger_bands(data: &[Candle], window: usize, num_std_dev: f64) -> BollingerBands {
    let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
    let rolling_mean = rolling_mean(&closes, window);
    let rolling_std = RollingStd::new(window).calculate(data);

    let band = |sign: f64| -> Vec<Option<f64>> {
        rolling_mean
            .iter()
            .zip(rolling_std.iter())
            .map(|(m, s)| Some((*m)? + sign * (*s)? * num_std_dev))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerBands {
        rolling_mean,
        rolling_std,
        upper,
        lower,
    }
}
