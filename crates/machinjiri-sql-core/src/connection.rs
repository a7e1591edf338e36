//! Database connection contract and the connection provider.
//!
//! The query layer never talks to a driver directly. It needs a single
//! operation surface, [`Connection`], and a [`Database`] handle that pairs a
//! connection with the [`Grammar`] selected from its driver name. The handle
//! is cheap to clone and is passed explicitly to every builder.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::blueprint::Blueprint;
use crate::error::Result;
use crate::grammar::{grammar_for_driver, Grammar};
use crate::query::QueryBuilder;
use crate::value::SqlValue;

/// A result row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates a row from ordered column/value pairs.
    #[must_use]
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Returns the value of `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the text value of `column`.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_str)
    }

    /// Returns the integer value of `column`.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Raw outcome of running one statement on a connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Rows returned by the statement.
    pub rows: Vec<Row>,
    /// Number of rows affected.
    pub row_count: u64,
    /// Last generated identifier, if the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// The operation surface the query layer requires from a database driver.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Driver name used to select a grammar (`mysql`, `pgsql`, `sqlite`).
    fn driver(&self) -> &str;

    /// Runs `sql` with positional `bindings`.
    async fn execute_query(&self, sql: &str, bindings: &[SqlValue]) -> Result<QueryResult>;

    /// Starts a connection-level transaction. Transactions do not nest.
    async fn begin_transaction(&self) -> Result<()>;

    /// Commits the active transaction.
    async fn commit(&self) -> Result<()>;

    /// Rolls back the active transaction.
    async fn rollback(&self) -> Result<()>;
}

/// Explicitly owned connection provider.
///
/// # Example
///
/// ```rust,ignore
/// let db = Database::new(Arc::new(connection))?;
/// let users = db.table("users").where_("active", "=", true).get().await?;
/// ```
#[derive(Clone)]
pub struct Database {
    connection: Arc<dyn Connection>,
    grammar: Arc<dyn Grammar>,
}

impl Database {
    /// Creates a provider, selecting the grammar from the connection driver.
    pub fn new(connection: Arc<dyn Connection>) -> Result<Self> {
        Self::with_prefix(connection, "")
    }

    /// Creates a provider whose grammar prefixes every table name.
    pub fn with_prefix(connection: Arc<dyn Connection>, table_prefix: &str) -> Result<Self> {
        let grammar = grammar_for_driver(connection.driver(), table_prefix)?;
        Ok(Self {
            connection,
            grammar,
        })
    }

    /// Creates a provider with an explicit grammar.
    #[must_use]
    pub fn with_grammar(connection: Arc<dyn Connection>, grammar: Arc<dyn Grammar>) -> Self {
        Self {
            connection,
            grammar,
        }
    }

    /// Returns the connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Returns the grammar.
    #[must_use]
    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    /// Returns an empty query builder.
    #[must_use]
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(&self.connection), Arc::clone(&self.grammar))
    }

    /// Returns a query builder targeting `table`.
    #[must_use]
    pub fn table(&self, table: &str) -> QueryBuilder {
        self.query().table(table)
    }

    /// Returns a CREATE blueprint for `table`.
    #[must_use]
    pub fn create(&self, table: &str) -> Blueprint {
        Blueprint::create(table, self.query())
    }

    /// Returns an ALTER blueprint for `table`.
    #[must_use]
    pub fn alter(&self, table: &str) -> Blueprint {
        Blueprint::alter(table, self.query())
    }

    /// Drops `table`.
    pub async fn drop(&self, table: &str) -> Result<()> {
        Blueprint::drop(table, self.query()).build().await
    }

    /// Drops `table` if it exists.
    pub async fn drop_if_exists(&self, table: &str) -> Result<()> {
        Blueprint::drop_if_exists(table, self.query()).build().await
    }

    /// Starts a transaction.
    pub async fn begin_transaction(&self) -> Result<()> {
        self.connection.begin_transaction().await
    }

    /// Commits the active transaction.
    pub async fn commit(&self) -> Result<()> {
        self.connection.commit().await
    }

    /// Rolls back the active transaction.
    pub async fn rollback(&self) -> Result<()> {
        self.connection.rollback().await
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.connection.driver())
            .field("grammar", &self.grammar)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Int(7)),
            ("name".to_string(), SqlValue::Text("ada".into())),
        ]);
        assert_eq!(row.get_i64("id"), Some(7));
        assert_eq!(row.get_str("name"), Some("ada"));
        assert!(row.get("missing").is_none());
        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(row.len(), 2);
    }
}
