//! Expense analytics and forecasting
//!
//! Every component reads through a [`Ledger`](crate::ledger::Ledger) and holds
//! no state between calls:
//!
//! - [`Aggregator`] - monthly, yearly and windowed summaries, statistics, top-N
//! - [`TrendClassifier`] - month-over-month trajectory of one category
//! - [`Forecaster`] - regression-based next-period overspend estimate
//!
//! Pass `&db` (or `&memory_ledger`) to the constructors; `&L` is itself a ledger.

pub mod aggregator;
pub mod forecast;
pub mod regression;
pub mod trend;

pub use aggregator::Aggregator;
pub use forecast::{Forecaster, MIN_DATA_POINTS};
pub use regression::{FittedModel, LinearModel, OrdinaryLeastSquares, Regressor};
pub use trend::{TrendClassifier, DAYS_PER_MONTH, MAX_LOOKBACK_MONTHS};
