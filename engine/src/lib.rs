// Engine library root
// Signal pipeline: market data -> indicators -> composed signals -> one notification per run.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod services;

pub use error::EngineError;
