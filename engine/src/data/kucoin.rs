// KuCoin public candle endpoint as an `OhlcvSource`.
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::TimeFrame;
use std::time::Duration;

use super::market_data::{OhlcvRow, OhlcvSource};
use crate::config::ExchangeSettings;
use crate::error::EngineError;

const SUCCESS_CODE: &str = "200000";

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Vec<Vec<String>>>,
}

#[derive(Clone)]
pub struct KucoinClient {
    http: reqwest::Client,
    base_url: String,
}

impl KucoinClient {
    pub fn new(settings: &ExchangeSettings) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(300))
            .build()?;
        Ok(KucoinClient {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// "BTC/USDT" -> "BTC-USDT"
pub fn to_kucoin_symbol(pair: &str) -> String {
    pair.replace('/', "-").to_uppercase()
}

pub fn to_kucoin_interval(timeframe: TimeFrame) -> &'static str {
    match timeframe {
        TimeFrame::Minute1 => "1min",
        TimeFrame::Minute5 => "5min",
        TimeFrame::Minute15 => "15min",
        TimeFrame::Minute30 => "30min",
        TimeFrame::Hour1 => "1hour",
        TimeFrame::Day1 => "1day",
    }
}

/// KuCoin rows are `[time_s, open, close, high, low, volume, turnover]` as strings, newest first.
/// Rows come back as `[ts_ms, open, high, low, close, volume]`, oldest first. A row that does not
/// carry at least six parseable fields is passed through short so shape validation rejects it.
pub fn parse_candles_response(body: &str) -> Result<Vec<OhlcvRow>, EngineError> {
    let response: CandlesResponse = serde_json::from_str(body)?;
    if response.code != SUCCESS_CODE {
        return Err(EngineError::ExchangeError(format!(
            "KuCoin returned code {}: {}",
            response.code,
            response.msg.unwrap_or_default()
        )));
    }

    let mut rows: Vec<OhlcvRow> = response
        .data
        .unwrap_or_default()
        .iter()
        .map(|raw| {
            let parsed: Option<Vec<f64>> = raw.iter().take(6).map(|v| v.parse::<f64>().ok()).collect();
            match parsed {
                Some(v) if v.len() == 6 => vec![v[0] * 1000.0, v[1], v[3], v[4], v[2], v[5]],
                _ => Vec::new(),
            }
        })
        .collect();
    rows.reverse();
    Ok(rows)
}

#[async_trait]
impl OhlcvSource for KucoinClient {
    async fn fetch_ohlcv(
        &self,
        pair: &str,
        timeframe: TimeFrame,
        since_ms: i64,
    ) -> Result<Vec<OhlcvRow>, EngineError> {
        let url = format!("{}/api/v1/market/candles", self.base_url);
        let start_at = (since_ms / 1000).to_string();
        let end_at = Utc::now().timestamp().to_string();
        let symbol = to_kucoin_symbol(pair);

        tracing::debug!(pair = %pair, symbol = %symbol, %timeframe, since_ms, "Requesting KuCoin candles");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("type", to_kucoin_interval(timeframe)),
                ("symbol", symbol.as_str()),
                ("startAt", start_at.as_str()),
                ("endAt", end_at.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EngineError::ExchangeError(format!("HTTP {} from KuCoin: {}", status, body)));
        }
        parse_candles_response(&body)
    }
}
