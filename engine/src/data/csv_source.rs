// File-backed OHLCV source for offline runs.
use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};
use shared::models::TimeFrame;
use std::path::PathBuf;

use super::market_data::{OhlcvRow, OhlcvSource};
use crate::error::EngineError;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Reads `<dir>/<BASE>_<QUOTE>.csv` for each pair.
// CSV Header: timestamp,open,high,low,close,volume
// Sample row: 1700000000000,37000.5,37100.0,36950.2,37050.1,12.75
pub struct CsvOhlcvSource {
    dir: PathBuf,
}

impl CsvOhlcvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvOhlcvSource { dir: dir.into() }
    }

    pub fn path_for(&self, pair: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", pair.replace('/', "_")))
    }

    pub fn parse_rows(content: &str, since_ms: i64) -> Result<Vec<OhlcvRow>, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers()?.clone();
        let positions = COLUMNS
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|header| header.eq_ignore_ascii_case(name))
                    .ok_or_else(|| EngineError::DataValidationError(format!("Missing '{}' column in CSV header", name)))
            })
            .collect::<Result<Vec<usize>, EngineError>>()?;

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result?;
            let row = Self::parse_record(&record, &positions, idx + 2)?;
            if row[0] as i64 >= since_ms {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn parse_record(record: &StringRecord, positions: &[usize], line: usize) -> Result<OhlcvRow, EngineError> {
        positions
            .iter()
            .zip(COLUMNS.iter())
            .map(|(&pos, name)| {
                let field = record.get(pos).ok_or_else(|| {
                    EngineError::DataValidationError(format!("Missing '{}' field at line {}", name, line))
                })?;
                field.parse::<f64>().map_err(|e| {
                    EngineError::DataValidationError(format!("Error parsing '{}' at line {}: {}", name, line, e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl OhlcvSource for CsvOhlcvSource {
    async fn fetch_ohlcv(
        &self,
        pair: &str,
        _timeframe: TimeFrame,
        since_ms: i64,
    ) -> Result<Vec<OhlcvRow>, EngineError> {
        let path = self.path_for(pair);
        tracing::debug!(pair = %pair, path = %path.display(), "Reading replay candles");
        let content = tokio::fs::read_to_string(&path).await?;
        Self::parse_rows(&content, since_ms)
    }
}
