// Moving-average crossover: short SMA against long SMA of the close.
use super::{IndicatorCalculator, Sma};
use shared::models::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Long = 1,
    Short = -1,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Crossover {
    pub short_ma: Vec<Option<f64>>,
    pub long_ma: Vec<Option<f64>>,
    /// `None` wherever either average is still warming up.
    pub positions: Vec<Option<Position>>,
}

pub fn moving_average_crossover(data: &[Candle], short_window: usize, long_window: usize) -> Crossover {
    let short_ma = Sma::new(short_window).calculate(data);
    let long_ma = Sma::new(long_window).calculate(data);
    let positions = short_ma
        .iter()
        .zip(long_ma.iter())
        .map(|(short, long)| match (short, long) {
            (Some(s), Some(l)) if s > l => Some(Position::Long),
            (Some(_), Some(_)) => Some(Position::Short),
            _ => None,
        })
        .collect();

    Crossover {
        short_ma,
        long_ma,
        positions,
    }
}
