//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `owners` - Ledger owner resolution
//! - `expenses` - Expense CRUD and the [`Ledger`](crate::ledger::Ledger) implementation
//! - `expense_filter` - Dynamic WHERE/ORDER clause builder for expense queries
//! - `audit` - Access audit log

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod audit;
mod expense_filter;
mod expenses;
mod owners;

pub use audit::AuditEntry;
pub use expense_filter::{ExpenseFilter, FilterResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "SPENDCAST_DB_KEY";

/// Storage format for timestamps (lexicographic order == chronological order)
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Derive the SQLCipher key from a passphrase with Argon2id
///
/// The salt is fixed so a passphrase opens the same ledger wherever the file lives.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    const APP_SALT: &[u8; 16] = b"spendcast-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let derived = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?
        .hash
        .ok_or_else(|| Error::Encryption("Key derivation produced no output".to_string()))?;
    Ok(hex::encode(derived.as_bytes()))
}

/// Format a timestamp for storage
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a stored timestamp
pub(crate) fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Pooled handle to the ledger database
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open an encrypted ledger keyed by `SPENDCAST_DB_KEY`
    ///
    /// Fails when the variable is unset; use `new_unencrypted()` for local
    /// development without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let key = std::env::var(DB_KEY_ENV).map_err(|_| {
            Error::Encryption(format!(
                "Database encryption required. Set {} to your passphrase, \
                or pass --no-encrypt to use a plaintext database.",
                DB_KEY_ENV
            ))
        })?;
        Self::new_with_key(path, Some(&key))
    }

    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Open a ledger, applying `PRAGMA key` on every pooled connection when a
    /// passphrase is given
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let key_pragma = passphrase
            .map(|pass| derive_key(pass).map(|key| format!("PRAGMA key = 'x\"{}\"';", key)))
            .transpose()?;

        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            if let Some(pragma) = &key_pragma {
                conn.execute_batch(pragma)?;
            }
            Ok(())
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self { pool };
        db.run_migrations()?;
        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Backed by a temporary file rather than `:memory:` since each pooled
    /// connection would otherwise open its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "spendcast_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Ledger owners (one per authenticated identity)
            CREATE TABLE IF NOT EXISTS owners (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                owner_id INTEGER NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
                amount REAL NOT NULL CHECK (amount >= 0),
                category TEXT NOT NULL,
                occurred_at DATETIME NOT NULL,             -- YYYY-MM-DD HH:MM:SS, UTC
                notes TEXT,
                receipt_reference TEXT,                    -- opaque pointer to a receipt
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_owner_date ON expenses(owner_id, occurred_at);
            CREATE INDEX IF NOT EXISTS idx_expenses_owner_category ON expenses(owner_id, category);

            -- Audit log (tracks API access)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                user_email TEXT NOT NULL,
                action TEXT NOT NULL,
                entity_type TEXT,
                entity_id INTEGER,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_user ON audit_log(user_email);
            CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log(timestamp);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
