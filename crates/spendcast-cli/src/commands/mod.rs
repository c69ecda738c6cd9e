//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init command and shared utilities (open_db, resolve_owner, load_config)
//! - `expenses` - Ledger commands (add, list, show, update, delete)
//! - `reports` - Summary and statistics commands
//! - `analytics` - Trend and forecast commands
//! - `extract` - Receipt text extraction
//! - `export` - CSV export
//! - `serve` - Web server command

pub mod analytics;
pub mod core;
pub mod expenses;
pub mod export;
pub mod extract;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use analytics::*;
pub use core::*;
pub use expenses::*;
pub use export::*;
pub use extract::*;
pub use reports::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
