// Simple Moving Average (SMA) indicator implementation
use super::{rolling_mean, IndicatorCalculator};
use serde_json::Value;
use shared::models::Candle;

pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("SMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        rolling_mean(&closes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::tests::candles_from_closes;

    fn assert_option_vec_eq(a: &[Option<f64>], b: &[Option<f64>]) {
        assert_eq!(a.len(), b.len(), "Vectors differ in length");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            match (val_a, val_b) {
                (None, None) => {}
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, x, y),
                _ => panic!("Mismatch at index {}: {:?} != {:?}", i, val_a, val_b),
            }
        }
    }

    #[test]
    fn test_sma_calculation() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sma = Sma::new(3);
        let results = sma.calculate(&candles);
        // expected: None, None, (1+2+3)/3=2.0, (2+3+4)/3=3.0, (3+4+5)/3=4.0
        assert_option_vec_eq(&results, &[None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        let results = Sma::new(3).calculate(&candles);
        assert_option_vec_eq(&results, &[None, None]);
    }

    #[test]
    fn test_sma_period_one() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        let results = Sma::new(1).calculate(&candles);
        // SMA(1) is just the close price
        assert_option_vec_eq(&results, &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sma_empty_data() {
        let results = Sma::new(3).calculate(&[]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_sma_name_and_parameters() {
        let sma = Sma::new(50);
        assert_eq!(sma.name(), "SMA(50)");
        assert_eq!(sma.parameters()["period"], 50);
    }
}
