use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("OHLCV data validation error: {0}")]
    DataValidationError(String),

    #[error("Transport error: {source}")]
    TransportError {
        #[from]
        source: reqwest::Error,
    },

    // The remote service answered, but rejected the request.
    #[error("Exchange error: {0}")]
    ExchangeError(String),

    #[error("Insufficient data: need at least {required} rows, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Whether a later attempt at the same I/O call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::DataValidationError(_)
                | EngineError::TransportError { .. }
                | EngineError::ExchangeError(_)
                | EngineError::NotificationError(_)
                | EngineError::IoError { .. }
        )
    }
}
