// Turns one pair's indicator readings into a trade signal with risk annotations.
use chrono::{DateTime, Utc};
use shared::models::{Direction, IndicatorFamily, SignalSection, TradeSignal, Trend};

use super::helpers::{calculate_risk_to_reward, calculate_stop_loss, calculate_target_price, calculate_trade_size};
use crate::config::SignalSettings;
use crate::data::CandleSeries;
use crate::error::EngineError;
use crate::indicators::rsi::{OVERBOUGHT, OVERSOLD};
use crate::indicators::{IndicatorBundle, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct SignalComposer {
    pub stop_loss_pct: f64,
    pub total_balance: f64,
    pub risk_percentage: f64,
}

impl SignalComposer {
    pub fn from_settings(settings: &SignalSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        let stop_loss_pct = settings
            .stop_loss_pct
            .ok_or_else(|| EngineError::ConfigError("stop_loss_pct is required".to_string()))?;
        Ok(SignalComposer {
            stop_loss_pct,
            total_balance: settings.total_balance,
            risk_percentage: settings.risk_percentage,
        })
    }

    /// Returns `None` when none of the crossover, RSI or Bollinger families leans either way.
    pub fn compose(
        &self,
        series: &CandleSeries,
        indicators: &IndicatorBundle,
        trend_1h: Trend,
        trend_15m: Trend,
        generated_at: DateTime<Utc>,
    ) -> Option<TradeSignal> {
        let entry_price = series.latest()?.close;
        let mut sections = Vec::new();
        // Each firing section overwrites the ratio; the last one wins.
        let mut risk_to_reward = None;

        let mut push_section = |indicator: IndicatorFamily, direction: Direction, reading: Option<f64>| {
            let stop_loss = calculate_stop_loss(entry_price, self.stop_loss_pct, direction);
            let target_price = calculate_target_price(entry_price, direction);
            risk_to_reward = calculate_risk_to_reward(entry_price, stop_loss, target_price);
            sections.push(SignalSection {
                indicator,
                direction,
                entry_price,
                stop_loss,
                target_price,
                reading,
            });
        };

        match indicators.latest_position() {
            Some(Position::Long) => push_section(IndicatorFamily::MovingAverageCrossover, Direction::Buy, None),
            Some(Position::Short) => push_section(IndicatorFamily::MovingAverageCrossover, Direction::Sell, None),
            None => {}
        }

        if let Some(rsi) = indicators.latest_rsi() {
            if rsi < OVERSOLD {
                push_section(IndicatorFamily::Rsi, Direction::Buy, Some(rsi));
            } else if rsi > OVERBOUGHT {
                push_section(IndicatorFamily::Rsi, Direction::Sell, Some(rsi));
            }
        }

        if let Some((lower, upper)) = indicators.latest_bands() {
            if entry_price < lower {
                push_section(IndicatorFamily::BollingerBands, Direction::Buy, None);
            } else if entry_price > upper {
                push_section(IndicatorFamily::BollingerBands, Direction::Sell, None);
            }
        }

        if sections.is_empty() {
            return None;
        }

        Some(TradeSignal {
            pair: series.pair().to_string(),
            trend_1h,
            trend_15m,
            sections,
            risk_to_reward,
            suggested_trade_size: calculate_trade_size(self.total_balance, self.risk_percentage),
            volume_spike: indicators.volume_spike,
            generated_at,
        })
    }
}
