use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{format_eastern_time, format_price};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Day1,
}

impl TimeFrame {
    /// Exchange-agnostic label, e.g. "15m".
    pub fn label(&self) -> &'static str {
        match self {
            TimeFrame::Minute1 => "1m",
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute15 => "15m",
            TimeFrame::Minute30 => "30m",
            TimeFrame::Hour1 => "1h",
            TimeFrame::Day1 => "1d",
        }
    }

    pub fn duration_ms(&self) -> i64 {
        let minutes = match self {
            TimeFrame::Minute1 => 1,
            TimeFrame::Minute5 => 5,
            TimeFrame::Minute15 => 15,
            TimeFrame::Minute30 => 30,
            TimeFrame::Hour1 => 60,
            TimeFrame::Day1 => 1440,
        };
        minutes * 60_000
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Bullish => "Bullish",
            Trend::Bearish => "Bearish",
            Trend::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// The three indicator families that can make a pair signal-worthy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IndicatorFamily {
    MovingAverageCrossover,
    Rsi,
    BollingerBands,
}

impl IndicatorFamily {
    pub fn display_name(&self) -> &'static str {
        match self {
            IndicatorFamily::MovingAverageCrossover => "Moving Average Crossover",
            IndicatorFamily::Rsi => "RSI",
            IndicatorFamily::BollingerBands => "Bollinger Bands",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSection {
    pub indicator: IndicatorFamily,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target_price: f64,
    /// Indicator reading worth echoing in the message (the RSI value).
    pub reading: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub pair: String,
    pub trend_1h: Trend,
    pub trend_15m: Trend,
    pub sections: Vec<SignalSection>,
    pub risk_to_reward: Option<f64>,
    pub suggested_trade_size: f64,
    pub volume_spike: bool,
    pub generated_at: DateTime<Utc>,
}

pub const CAUTION_FOOTER: &str = "🚨 **Caution**: Conflicting signals from RSI and Bollinger Bands.";

impl TradeSignal {
    pub fn timestamp_est(&self) -> String {
        format_eastern_time(self.generated_at)
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "⚠️ **Trading Signal for {}** ⚠️", self.pair)?;
        writeln!(
            f,
            "**Trend Overview**: {} on 1-hour, {} on 15-minute chart.",
            self.trend_1h, self.trend_15m
        )?;

        for section in &self.sections {
            writeln!(f, "**{}**:", section.indicator.display_name())?;
            let marker = match section.direction {
                Direction::Buy => "🔵 Signal: Buy",
                Direction::Sell => "🔴 Signal: Sell",
            };
            match section.reading {
                Some(value) => writeln!(f, "{} (RSI={:.2})", marker, value)?,
                None => writeln!(f, "{}", marker)?,
            }
            writeln!(f, "💰 Entry Price: ${}", format_price(section.entry_price))?;
            writeln!(f, "🛑 Stop Loss: ${}", format_price(section.stop_loss))?;
        }

        if self.volume_spike {
            writeln!(f, "📈 **Volume Spike**: latest volume above its 50-bar average")?;
        }
        if let Some(ratio) = self.risk_to_reward {
            writeln!(f, "📊 **Risk-to-Reward Ratio**: {}", format_price(ratio))?;
        }
        writeln!(
            f,
            "💼 **Suggested Trade Size**: {} units",
            format_price(self.suggested_trade_size)
        )?;
        writeln!(f, "🕒 **Time of Signal**: {}", self.timestamp_est())?;
        f.write_str(CAUTION_FOOTER)
    }
}
