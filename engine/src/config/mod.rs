pub mod settings;

pub use settings::{ExchangeSettings, IndicatorSettings, RetrySettings, SignalSettings, TelegramSettings};
