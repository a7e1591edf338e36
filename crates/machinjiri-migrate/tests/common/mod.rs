//! Shared fixtures for migration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use machinjiri_migrate::prelude::*;
use machinjiri_sql_core::SqlValue;
use machinjiri_sql_sqlite::SqliteConnector;

/// A private in-memory SQLite database.
pub async fn memory_database() -> Database {
    let conn = SqliteConnector::connect("sqlite::memory:", 1)
        .await
        .unwrap();
    Database::new(Arc::new(conn)).unwrap()
}

/// Creates `table` on `up`, drops it on `down`, and counts both.
#[derive(Clone)]
pub struct CreateTable {
    pub table: &'static str,
    pub ups: Arc<AtomicUsize>,
    pub downs: Arc<AtomicUsize>,
    pub log: Arc<std::sync::Mutex<Vec<String>>>,
}

impl CreateTable {
    pub fn new(table: &'static str, log: &Arc<std::sync::Mutex<Vec<String>>>) -> Self {
        Self {
            table,
            ups: Arc::new(AtomicUsize::new(0)),
            downs: Arc::new(AtomicUsize::new(0)),
            log: Arc::clone(log),
        }
    }

    pub fn ups(&self) -> usize {
        self.ups.load(Ordering::SeqCst)
    }

    pub fn downs(&self) -> usize {
        self.downs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Migration for CreateTable {
    async fn up(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
        self.ups.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("up:{}", self.table));
        let mut table = db.create(self.table);
        table.id("id");
        table.string("name", 100).not_null();
        table.if_not_exists();
        table.build().await
    }

    async fn down(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
        self.downs.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("down:{}", self.table));
        db.drop_if_exists(self.table).await
    }
}

/// Fails on `up`.
pub struct Broken;

#[async_trait]
impl Migration for Broken {
    async fn up(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
        db.query()
            .execute_sql("INSERT INTO no_such_table (a) VALUES (1)")
            .await
            .map(|_| ())
    }

    async fn down(&self, _db: &Database) -> machinjiri_sql_core::Result<()> {
        Ok(())
    }
}

/// Returns whether `table` exists in the SQLite catalog.
pub async fn table_exists(db: &Database, table: &str) -> bool {
    let result = db
        .connection()
        .execute_query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[SqlValue::Text(table.to_string())],
        )
        .await
        .unwrap();
    !result.rows.is_empty()
}
