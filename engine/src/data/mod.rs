// Market data sources and the retrying fetcher.
pub mod csv_source;
pub mod kucoin;
pub mod market_data;

pub use market_data::{CandleSeries, MarketDataFetcher, OhlcvRow, OhlcvSource};
