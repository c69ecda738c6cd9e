//! Ledger owner resolution

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Owner;

impl Database {
    /// Resolve an identity to its owner row, creating it on first sight
    pub fn upsert_owner(&self, email: &str) -> Result<Owner> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidData("Owner identity cannot be empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO owners (email) VALUES (?) ON CONFLICT(email) DO NOTHING",
            params![email],
        )?;

        let owner = conn.query_row(
            "SELECT id, email, created_at FROM owners WHERE email = ?",
            params![email],
            |row| {
                let created_at: String = row.get(2)?;
                Ok(Owner {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    created_at: parse_datetime(&created_at)?,
                })
            },
        )?;

        Ok(owner)
    }

    /// Look up an owner by identity without creating it
    pub fn get_owner(&self, email: &str) -> Result<Option<Owner>> {
        let conn = self.conn()?;
        let owner = conn
            .query_row(
                "SELECT id, email, created_at FROM owners WHERE email = ?",
                params![email.trim()],
                |row| {
                    let created_at: String = row.get(2)?;
                    Ok(Owner {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        created_at: parse_datetime(&created_at)?,
                    })
                },
            )
            .optional()?;
        Ok(owner)
    }
}
