// Signal engine settings: a JSON file for trading parameters, environment variables for secrets.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::EngineError;

pub const DEFAULT_KUCOIN_BASE_URL: &str = "https://api.kucoin.com";
pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

fn default_total_balance() -> f64 {
    10_000.0
}

fn default_risk_percentage() -> f64 {
    2.0
}

fn default_signal_check_interval() -> u64 {
    100
}

fn default_lookback_hours() -> i64 {
    24
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalSettings {
    #[serde(default)]
    pub trading_pairs: Vec<String>,
    // Required, but kept optional here so a missing key is reported by `validate`.
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
    #[serde(default = "default_total_balance")]
    pub total_balance: f64,
    #[serde(default = "default_risk_percentage")]
    pub risk_percentage: f64,
    /// Seconds between scheduled runs. Owned by the scheduler, not the aggregator.
    #[serde(default = "default_signal_check_interval")]
    pub signal_check_interval: u64,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
    #[serde(flatten)]
    pub indicators: IndicatorSettings,
    #[serde(flatten)]
    pub retry: RetrySettings,
}

impl Default for SignalSettings {
    fn default() -> Self {
        SignalSettings {
            trading_pairs: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()],
            stop_loss_pct: None,
            total_balance: default_total_balance(),
            risk_percentage: default_risk_percentage(),
            signal_check_interval: default_signal_check_interval(),
            lookback_hours: default_lookback_hours(),
            indicators: IndicatorSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl SignalSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Checks the keys a run cannot do without. Nothing is fetched or sent when this fails.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.trading_pairs.is_empty() {
            return Err(EngineError::ConfigError("trading_pairs must not be empty".to_string()));
        }
        match self.stop_loss_pct {
            None => return Err(EngineError::ConfigError("stop_loss_pct is required".to_string())),
            Some(pct) if !pct.is_finite() || pct < 0.0 => {
                return Err(EngineError::ConfigError(format!(
                    "stop_loss_pct must be a non-negative number, got {}",
                    pct
                )));
            }
            Some(_) => {}
        }
        if self.signal_check_interval == 0 {
            return Err(EngineError::ConfigError("signal_check_interval must be positive".to_string()));
        }
        if self.lookback_hours <= 0 {
            return Err(EngineError::ConfigError("lookback_hours must be positive".to_string()));
        }
        self.indicators.validate()?;
        self.retry.validate()
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(self.lookback_hours)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.signal_check_interval)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IndicatorSettings {
    pub short_ma_window: usize,
    pub long_ma_window: usize,
    pub rsi_window: usize,
    pub bollinger_window: usize,
    pub bollinger_std_dev: f64,
    pub volume_spike_threshold: f64,
    #[serde(rename = "1h_short_ma_window")]
    pub trend_1h_short_window: usize,
    #[serde(rename = "1h_long_ma_window")]
    pub trend_1h_long_window: usize,
    #[serde(rename = "15m_short_ma_window")]
    pub trend_15m_short_window: usize,
    #[serde(rename = "15m_long_ma_window")]
    pub trend_15m_long_window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            short_ma_window: 50,
            long_ma_window: 200,
            rsi_window: 14,
            bollinger_window: 20,
            bollinger_std_dev: 2.0,
            volume_spike_threshold: 1.5,
            trend_1h_short_window: 50,
            trend_1h_long_window: 200,
            trend_15m_short_window: 50,
            trend_15m_long_window: 200,
        }
    }
}

impl IndicatorSettings {
    fn validate(&self) -> Result<(), EngineError> {
        let windows = [
            ("short_ma_window", self.short_ma_window),
            ("long_ma_window", self.long_ma_window),
            ("rsi_window", self.rsi_window),
            ("bollinger_window", self.bollinger_window),
            ("1h_short_ma_window", self.trend_1h_short_window),
            ("1h_long_ma_window", self.trend_1h_long_window),
            ("15m_short_ma_window", self.trend_15m_short_window),
            ("15m_long_ma_window", self.trend_15m_long_window),
        ];
        for (key, window) in windows {
            if window == 0 {
                return Err(EngineError::ConfigError(format!("{} must be greater than 0", key)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub fetch_retries: u32,
    pub fetch_retry_delay_secs: u64,
    pub notify_retries: u32,
    pub notify_retry_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            fetch_retries: 3,
            fetch_retry_delay_secs: 5,
            notify_retries: 3,
            notify_retry_delay_secs: 5,
        }
    }
}

impl RetrySettings {
    /// Retry settings from a config file that may be absent or incomplete, for runs
    /// that only need to notify. Falls back to the defaults when the file is unusable.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match SignalSettings::from_file(path) {
            Ok(settings) if settings.retry.validate().is_ok() => settings.retry,
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Retry counts must be at least 1, using defaults");
                RetrySettings::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "No usable config, using default retries");
                RetrySettings::default()
            }
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.fetch_retries == 0 || self.notify_retries == 0 {
            return Err(EngineError::ConfigError("retry counts must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_secs(self.fetch_retry_delay_secs)
    }

    pub fn notify_delay(&self) -> Duration {
        Duration::from_secs(self.notify_retry_delay_secs)
    }
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
    pub base_url: String,
}

impl TelegramSettings {
    pub fn from_env() -> Result<Self, EngineError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
        let chat_id = std::env::var("CHAT_ID").ok();
        match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Ok(TelegramSettings {
                    bot_token,
                    chat_id,
                    base_url: std::env::var("TELEGRAM_BASE_URL")
                        .unwrap_or_else(|_| DEFAULT_TELEGRAM_BASE_URL.to_string()),
                })
            }
            _ => Err(EngineError::ConfigError(
                "TELEGRAM_BOT_TOKEN and CHAT_ID environment variables must be set".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub base_url: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        ExchangeSettings { base_url: DEFAULT_KUCOIN_BASE_URL.to_string() }
    }
}

impl ExchangeSettings {
    pub fn from_env() -> Self {
        std::env::var("KUCOIN_BASE_URL")
            .map(|base_url| ExchangeSettings { base_url })
            .unwrap_or_default()
    }
}
