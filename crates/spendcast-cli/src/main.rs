//! Spendcast CLI - Expense analytics and forecasting
//!
//! Usage:
//!   spendcast init                          Initialize database
//!   spendcast add --amount 12.5 -c food     Record an expense
//!   spendcast summary month                 This month by category
//!   spendcast trends                        Category trends
//!   spendcast predict food                  Overspend forecast
//!   spendcast serve --port 3000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt, &cli.owner),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt, &config).await,
        Commands::Extract { image } => commands::cmd_extract(&config.extraction, &image).await,
        command => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let owner = commands::resolve_owner(&db, &cli.owner)?;
            let analytics = &config.analytics;

            match command {
                Commands::Add {
                    amount,
                    category,
                    date,
                    notes,
                    receipt,
                } => commands::cmd_add(
                    &db,
                    owner,
                    amount,
                    &category,
                    date.as_deref(),
                    notes.as_deref(),
                    receipt.as_deref(),
                )
                .map(|_| ()),
                Commands::List {
                    category,
                    from,
                    to,
                    limit,
                    offset,
                } => commands::cmd_list(
                    &db,
                    owner,
                    category.as_deref(),
                    from.as_deref(),
                    to.as_deref(),
                    limit,
                    offset,
                ),
                Commands::Show { id } => commands::cmd_show(&db, owner, id),
                Commands::Update {
                    id,
                    amount,
                    category,
                    date,
                    notes,
                    receipt,
                } => {
                    let edit = commands::ExpenseEdit {
                        amount,
                        category,
                        date,
                        notes,
                        receipt,
                    };
                    commands::cmd_update(&db, owner, id, &edit)
                }
                Commands::Delete { id } => commands::cmd_delete(&db, owner, id),
                Commands::Summary { period } => match period {
                    SummaryPeriod::Month { year, month } => {
                        commands::cmd_summary_month(&db, owner, year, month)
                    }
                    SummaryPeriod::Year { year } => commands::cmd_summary_year(&db, owner, year),
                    SummaryPeriod::Range { from, to } => {
                        commands::cmd_summary_range(&db, owner, &from, &to)
                    }
                },
                Commands::Stats => commands::cmd_stats(&db, owner),
                Commands::Top { limit } => {
                    commands::cmd_top(&db, owner, limit.unwrap_or(analytics.default_top_limit))
                }
                Commands::Trend { category, months } => commands::cmd_trend(
                    &db,
                    owner,
                    &category,
                    months.unwrap_or(analytics.default_lookback_months),
                ),
                Commands::Trends { months } => commands::cmd_trends(
                    &db,
                    owner,
                    months.unwrap_or(analytics.default_lookback_months),
                ),
                Commands::Predict { category } => {
                    commands::cmd_predict(&db, owner, category.as_deref())
                }
                Commands::Export {
                    output,
                    category,
                    from,
                    to,
                } => commands::cmd_export(
                    &db,
                    owner,
                    output.as_deref(),
                    category.as_deref(),
                    from.as_deref(),
                    to.as_deref(),
                ),
                Commands::Init | Commands::Serve { .. } | Commands::Extract { .. } => {
                    anyhow::bail!("command does not operate on the ledger")
                }
            }
        }
    }
}
