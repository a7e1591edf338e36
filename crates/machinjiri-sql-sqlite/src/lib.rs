//! # machinjiri-sql-sqlite
//!
//! SQLite connection for `machinjiri-sql-core`, backed by an sqlx pool.
//!
//! Statements that produce rows (`SELECT`, `PRAGMA`, `WITH`, anything with a
//! `RETURNING` clause) are fetched; every other statement is executed and
//! reports its affected row count and the last inserted rowid.
//!
//! Transactions are pinned to one pooled connection between
//! [`begin_transaction`](Connection::begin_transaction) and
//! `commit`/`rollback`. While one is open every statement runs on it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use machinjiri_sql_core::Database;
//! use machinjiri_sql_sqlite::SqliteConnector;
//!
//! let conn = SqliteConnector::connect("sqlite://app.db", 5).await?;
//! let db = Database::new(Arc::new(conn))?;
//! ```

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use machinjiri_sql_core::{Connection, DbError, QueryResult, Result, Row, SqlValue};
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, Sqlite, Transaction, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::debug;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A [`Connection`] over an sqlx [`SqlitePool`].
pub struct SqliteConnector {
    pool: SqlitePool,
    transaction: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteConnector {
    /// Opens a pool for `url`, creating the database file if missing.
    ///
    /// `sqlite::memory:` databases are private to one pooled connection, so
    /// use `max_connections = 1` for them.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Configuration`] for an empty or malformed URL, or
    /// when the pool cannot be opened.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(DbError::Configuration(String::from(
                "database url is not set",
            )));
        }
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::Configuration(format!("invalid sqlite url '{url}': {e}")))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| DbError::Configuration(format!("cannot open '{url}': {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
        }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl fmt::Debug for SqliteConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnector")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for SqliteConnector {
    fn driver(&self) -> &str {
        "sqlite"
    }

    async fn execute_query(&self, sql: &str, bindings: &[SqlValue]) -> Result<QueryResult> {
        let mut query = sqlx::query(sql);
        for value in bindings {
            query = bind_value(query, value);
        }

        let mut guard = self.transaction.lock().await;
        if returns_rows(sql) {
            let rows = match guard.as_mut() {
                Some(tx) => query.fetch_all(&mut **tx).await,
                None => query.fetch_all(&self.pool).await,
            }
            .map_err(|e| DbError::execution(sql, e))?;

            let rows = rows
                .iter()
                .map(|row| decode_row(sql, row))
                .collect::<Result<Vec<_>>>()?;
            Ok(QueryResult {
                row_count: rows.len() as u64,
                rows,
                last_insert_id: None,
            })
        } else {
            let done = match guard.as_mut() {
                Some(tx) => query.execute(&mut **tx).await,
                None => query.execute(&self.pool).await,
            }
            .map_err(|e| DbError::execution(sql, e))?;

            Ok(QueryResult {
                rows: Vec::new(),
                row_count: done.rows_affected(),
                last_insert_id: Some(done.last_insert_rowid()),
            })
        }
    }

    async fn begin_transaction(&self) -> Result<()> {
        let mut guard = self.transaction.lock().await;
        if guard.is_some() {
            return Err(DbError::Transaction(String::from(
                "a transaction is already active",
            )));
        }
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::execution("BEGIN", e))?;
        debug!("Transaction started");
        *guard = Some(tx);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let tx = self
            .transaction
            .lock()
            .await
            .take()
            .ok_or_else(|| DbError::Transaction(String::from("no active transaction to commit")))?;
        tx.commit()
            .await
            .map_err(|e| DbError::execution("COMMIT", e))?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let tx = self.transaction.lock().await.take().ok_or_else(|| {
            DbError::Transaction(String::from("no active transaction to roll back"))
        })?;
        tx.rollback()
            .await
            .map_err(|e| DbError::execution("ROLLBACK", e))?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

/// Whether `sql` yields a row set.
fn returns_rows(sql: &str) -> bool {
    let upper = sql.trim_start().to_uppercase();
    ["SELECT", "PRAGMA", "WITH", "VALUES", "EXPLAIN"]
        .iter()
        .any(|keyword| upper.starts_with(keyword))
        || upper.contains(" RETURNING ")
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

/// Converts a result row by the storage class of each value.
fn decode_row(sql: &str, row: &SqliteRow) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row
            .try_get_raw(index)
            .map_err(|e| DbError::execution(sql, e))?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_uppercase();
            let decoded = match storage.as_str() {
                "INTEGER" | "BOOLEAN" | "INT8" => {
                    row.try_get_unchecked::<i64, _>(index).map(SqlValue::Int)
                }
                "REAL" | "NUMERIC" => row.try_get_unchecked::<f64, _>(index).map(SqlValue::Float),
                "BLOB" => row
                    .try_get_unchecked::<Vec<u8>, _>(index)
                    .map(SqlValue::Blob),
                _ => row
                    .try_get_unchecked::<String, _>(index)
                    .map(SqlValue::Text),
            };
            decoded.map_err(|e| DbError::execution(sql, e))?
        };
        columns.push((String::from(column.name()), value));
    }
    Ok(Row::new(columns))
}
