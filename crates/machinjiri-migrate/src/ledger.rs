//! Migration ledger.
//!
//! This module manages the table that records which migrations have been
//! applied and in which batch. The table is created on [`Ledger::open`] if
//! it does not exist yet:
//!
//! ```sql
//! migration VARCHAR(255) NOT NULL PRIMARY KEY,
//! batch     INTEGER NOT NULL,
//! created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use machinjiri_sql_core::{Database, Row, SqlValue, TableOptions};

use crate::error::Result;

/// Default ledger table name.
pub const DEFAULT_TABLE: &str = "migrations";

/// A row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Migration key.
    pub migration: String,
    /// Batch the migration was applied in.
    pub batch: i64,
    /// When the row was written, if the database reported it.
    pub created_at: Option<DateTime<Utc>>,
}

/// Reads and writes the ledger table.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
    table: String,
}

impl Ledger {
    /// Opens the ledger in `table`, creating it if missing.
    pub async fn open(db: Database, table: &str) -> Result<Self> {
        let q = db.query();
        let mut migration = q.string("migration", 255);
        migration.not_null().primary_key();
        let mut batch = q.integer("batch");
        batch.not_null();
        let mut created_at = q.timestamp("created_at");
        created_at.default_raw("CURRENT_TIMESTAMP");

        q.fresh()
            .create_table(
                table,
                [migration, batch, created_at],
                TableOptions::default(),
            )
            .execute()
            .await?;

        Ok(Self {
            db,
            table: String::from(table),
        })
    }

    /// Returns the ledger table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns every applied migration key in application order.
    pub async fn applied(&self) -> Result<Vec<String>> {
        let rows = self
            .db
            .table(&self.table)
            .select(["migration"])
            .order_by("batch", "asc")
            .order_by("migration", "asc")
            .get()
            .await?;
        Ok(rows.iter().filter_map(migration_name).collect())
    }

    /// Returns every ledger row in application order.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let rows = self
            .db
            .table(&self.table)
            .select(["migration", "batch", "created_at"])
            .order_by("batch", "asc")
            .order_by("migration", "asc")
            .get()
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(LedgerEntry {
                    migration: migration_name(row)?,
                    batch: row.get_i64("batch").unwrap_or_default(),
                    created_at: row.get("created_at").and_then(parse_timestamp),
                })
            })
            .collect())
    }

    /// Highest recorded batch, or 0 for an empty ledger.
    pub async fn last_batch(&self) -> Result<i64> {
        let max = self.db.table(&self.table).max("batch").await?;
        Ok(max.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Batch number for the next `migrate()` call.
    pub async fn next_batch(&self) -> Result<i64> {
        Ok(self.last_batch().await? + 1)
    }

    /// Keys recorded in `batch`, latest first.
    pub async fn migrations_in_batch(&self, batch: i64) -> Result<Vec<String>> {
        let rows = self
            .db
            .table(&self.table)
            .select(["migration"])
            .where_("batch", "=", batch)
            .order_by("migration", "desc")
            .get()
            .await?;
        Ok(rows.iter().filter_map(migration_name).collect())
    }

    /// Records `migration` as applied in `batch`.
    pub async fn record(&self, migration: &str, batch: i64) -> Result<()> {
        self.db
            .table(&self.table)
            .insert([
                ("migration", SqlValue::Text(String::from(migration))),
                ("batch", SqlValue::Int(batch)),
            ])
            .execute()
            .await?;
        Ok(())
    }

    /// Deletes the row of `migration`.
    pub async fn remove(&self, migration: &str) -> Result<()> {
        self.db
            .table(&self.table)
            .where_("migration", "=", migration)
            .delete()
            .execute()
            .await?;
        Ok(())
    }
}

fn migration_name(row: &Row) -> Option<String> {
    row.get_str("migration").map(String::from)
}

fn parse_timestamp(value: &SqlValue) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc()))
        .ok()
}
