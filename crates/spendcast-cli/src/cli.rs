//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendcast - Track expenses and see where spending is heading
#[derive(Parser)]
#[command(name = "spendcast")]
#[command(about = "Self-hosted expense analytics and forecasting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendcast.db", global = true)]
    pub db: PathBuf,

    /// Owner whose ledger the command reads and writes
    #[arg(long, default_value = "local", global = true)]
    pub owner: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SPENDCAST_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Config file (defaults to the platform data directory, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Record an expense
    Add {
        /// Amount (non-negative)
        #[arg(short, long)]
        amount: f64,

        /// Category: food, travel, entertainment, utilities, healthcare, shopping, education, other
        #[arg(short, long)]
        category: String,

        /// When it happened (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(short, long)]
        date: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Reference to a receipt (file name, URL, ...)
        #[arg(long)]
        receipt: Option<String>,
    },

    /// List expenses, newest first
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Maximum number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Number of expenses to skip
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Show one expense
    Show {
        /// Expense ID
        id: i64,
    },

    /// Change fields of an expense
    Update {
        /// Expense ID
        id: i64,

        #[arg(short, long)]
        amount: Option<f64>,

        #[arg(short, long)]
        category: Option<String>,

        /// YYYY-MM-DD or RFC 3339
        #[arg(short, long)]
        date: Option<String>,

        /// New notes (empty string clears them)
        #[arg(short, long)]
        notes: Option<String>,

        /// New receipt reference (empty string clears it)
        #[arg(long)]
        receipt: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: i64,
    },

    /// Spending summaries by category or month
    Summary {
        #[command(subcommand)]
        period: SummaryPeriod,
    },

    /// Lifetime statistics
    Stats,

    /// Largest expenses
    Top {
        /// Number of expenses (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Spending trend of one category
    Trend {
        /// Category to analyze
        category: String,

        /// Lookback in months (defaults to the configured lookback)
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Spending trends of every category
    Trends {
        /// Lookback in months (defaults to the configured lookback)
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Forecast next month's overspend
    Predict {
        /// Category to forecast (all categories if omitted)
        category: Option<String>,
    },

    /// Read amount and category from a receipt image
    Extract {
        /// Image file (at most 5 MiB)
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Export expenses to CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access headers or an API key.
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum SummaryPeriod {
    /// One calendar month (defaults to the current month)
    Month {
        #[arg(short, long)]
        year: Option<i32>,

        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Month-by-month totals for a year (defaults to the current year)
    Year {
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Category totals over a date range
    Range {
        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: String,
    },
}
