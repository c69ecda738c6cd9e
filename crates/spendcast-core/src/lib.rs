//! Spendcast Core Library
//!
//! Shared functionality for the Spendcast expense tracker:
//! - Encrypted SQLite ledger with owner-scoped queries
//! - Monthly, yearly and windowed spending summaries
//! - Category trend classification
//! - Regression-based overspend forecasting with pluggable models
//! - Receipt text extraction through local or hosted vision models
//! - CSV export and TOML configuration

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod extract;
pub mod ledger;
pub mod models;

pub use analytics::{
    Aggregator, FittedModel, Forecaster, LinearModel, OrdinaryLeastSquares, Regressor,
    TrendClassifier, DAYS_PER_MONTH, MAX_LOOKBACK_MONTHS, MIN_DATA_POINTS,
};
pub use config::{AnalyticsConfig, AppConfig, ExtractionBackend, ExtractionConfig};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use export::export_expenses_csv;
pub use extract::{
    Extraction, ExtractorClient, MockExtractor, OllamaExtractor, OpenAICompatibleExtractor,
    TextExtractor, MAX_IMAGE_BYTES,
};
pub use ledger::{Ledger, LedgerQuery, MemoryLedger};
