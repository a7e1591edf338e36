//! Fluent query builder.
//!
//! A [`QueryBuilder`] stages one statement. Action-setting calls (`insert`,
//! `update`, `delete`, `create_table`, ...) pick what [`QueryBuilder::to_sql`]
//! compiles; the last one wins and the default is a `SELECT *`.
//!
//! All values travel as positional `?` bindings. [`QueryBuilder::bindings`]
//! returns them in exactly the order their placeholders appear in the
//! compiled SQL.
//!
//! # Example
//!
//! ```rust,ignore
//! let rows = db
//!     .table("users")
//!     .where_("a", "=", 1)
//!     .or_where("b", ">", 2)
//!     .get()
//!     .await?;
//! // SELECT * FROM users WHERE a = ? OR b > ?   bindings: [1, 2]
//! ```
//!
//! [`QueryBuilder::execute`] consumes the builder, so a statement can only be
//! run once. Use [`QueryBuilder::fresh`] for the next one.

mod clause;
mod compile;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

pub use clause::{Boolean, Join, JoinKind, OrderDirection, WhereClause};

use crate::column::ColumnBuilder;
use crate::connection::{Connection, Row};
use crate::error::Result;
use crate::grammar::{ColumnType, Grammar, TableOptions};
use crate::value::{SqlValue, ToSqlValue};

/// Statement kind staged on a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// `SELECT`
    #[default]
    Select,
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// `CREATE TABLE`
    Create,
    /// `ALTER TABLE`
    Alter,
    /// `DROP TABLE`
    Drop,
    /// `TRUNCATE`
    Truncate,
}

impl Action {
    /// Returns the lowercase action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Alter => "alter",
            Self::Drop => "drop",
            Self::Truncate => "truncate",
        }
    }

    /// Returns `true` for actions that return a row set.
    #[must_use]
    pub const fn returns_rows(self) -> bool {
        matches!(self, Self::Select)
    }
}

/// Result of executing a builder.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Row set of a SELECT.
    Rows(Vec<Row>),
    /// Affected row count of any other statement.
    Affected {
        row_count: u64,
        last_insert_id: Option<i64>,
    },
}

impl ExecutionOutcome {
    /// Returns the rows, or an empty vector for non-SELECT outcomes.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected { .. } => Vec::new(),
        }
    }

    /// Returns the affected row count; for row sets, the number of rows.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Affected { row_count, .. } => *row_count,
        }
    }

    /// Returns the last generated identifier, if any.
    #[must_use]
    pub const fn last_insert_id(&self) -> Option<i64> {
        match self {
            Self::Rows(_) => None,
            Self::Affected { last_insert_id, .. } => *last_insert_id,
        }
    }
}

/// Fluent, single-use statement builder bound to a connection and grammar.
#[derive(Clone)]
pub struct QueryBuilder {
    connection: Arc<dyn Connection>,
    grammar: Arc<dyn Grammar>,
    action: Action,
    table: String,
    columns: Vec<String>,
    wheres: Vec<WhereClause>,
    where_bindings: Vec<SqlValue>,
    joins: Vec<Join>,
    orders: Vec<(String, OrderDirection)>,
    group_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    insert_data: Vec<(String, SqlValue)>,
    update_data: Vec<(String, SqlValue)>,
    create_columns: Vec<String>,
    table_options: TableOptions,
    alter_added: Vec<String>,
    alter_modified: Vec<String>,
    alter_dropped: Vec<String>,
    drop_if_exists: bool,
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(connection: Arc<dyn Connection>, grammar: Arc<dyn Grammar>) -> Self {
        Self {
            connection,
            grammar,
            action: Action::default(),
            table: String::new(),
            columns: Vec::new(),
            wheres: Vec::new(),
            where_bindings: Vec::new(),
            joins: Vec::new(),
            orders: Vec::new(),
            group_by: None,
            limit: None,
            offset: None,
            insert_data: Vec::new(),
            update_data: Vec::new(),
            create_columns: Vec::new(),
            table_options: TableOptions::default(),
            alter_added: Vec::new(),
            alter_modified: Vec::new(),
            alter_dropped: Vec::new(),
            drop_if_exists: false,
        }
    }

    /// Returns an empty builder over the same connection and grammar.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.connection), Arc::clone(&self.grammar))
    }

    /// Returns the grammar.
    #[must_use]
    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    /// Returns the staged action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Returns the target table, unprefixed.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    // ----- SELECT shape -----

    /// Sets the selected columns. An empty list selects `*`.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the target table.
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = String::from(table);
        self
    }

    /// Adds an `AND` condition.
    #[must_use]
    pub fn where_(self, column: &str, operator: &str, value: impl ToSqlValue) -> Self {
        self.where_with(column, operator, value, Boolean::And)
    }

    /// Adds an `OR` condition.
    #[must_use]
    pub fn or_where(self, column: &str, operator: &str, value: impl ToSqlValue) -> Self {
        self.where_with(column, operator, value, Boolean::Or)
    }

    /// Adds a condition with an explicit connective.
    #[must_use]
    pub fn where_with(
        mut self,
        column: &str,
        operator: &str,
        value: impl ToSqlValue,
        boolean: Boolean,
    ) -> Self {
        self.wheres.push(WhereClause::Basic {
            column: String::from(column),
            operator: String::from(operator),
            boolean,
        });
        self.where_bindings.push(value.to_sql_value());
        self
    }

    /// Adds `column IN (?, ...)`, one placeholder per value.
    #[must_use]
    pub fn where_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let before = self.where_bindings.len();
        self.where_bindings
            .extend(values.into_iter().map(ToSqlValue::to_sql_value));
        self.wheres.push(WhereClause::In {
            column: String::from(column),
            count: self.where_bindings.len() - before,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds `column NOT IN (?, ...)`, one placeholder per value.
    #[must_use]
    pub fn where_not_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let before = self.where_bindings.len();
        self.where_bindings
            .extend(values.into_iter().map(ToSqlValue::to_sql_value));
        self.wheres.push(WhereClause::NotIn {
            column: String::from(column),
            count: self.where_bindings.len() - before,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds `column IS NULL`.
    #[must_use]
    pub fn where_null(mut self, column: &str) -> Self {
        self.wheres.push(WhereClause::Null {
            column: String::from(column),
            boolean: Boolean::And,
        });
        self
    }

    /// Adds `column IS NOT NULL`.
    #[must_use]
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.wheres.push(WhereClause::NotNull {
            column: String::from(column),
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `INNER JOIN`.
    #[must_use]
    pub fn join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.push_join(JoinKind::Inner, table, first, operator, second)
    }

    /// Adds a `LEFT JOIN`.
    #[must_use]
    pub fn left_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.push_join(JoinKind::Left, table, first, operator, second)
    }

    /// Adds a `RIGHT JOIN`.
    #[must_use]
    pub fn right_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.push_join(JoinKind::Right, table, first, operator, second)
    }

    fn push_join(
        mut self,
        kind: JoinKind,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: String::from(table),
            first: String::from(first),
            operator: String::from(operator),
            second: String::from(second),
        });
        self
    }

    /// Appends an ordering. `desc` in any case sorts descending, anything
    /// else ascending.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.orders
            .push((String::from(column), OrderDirection::parse(direction)));
        self
    }

    /// Sets the GROUP BY column.
    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(String::from(column));
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ----- DML -----

    /// Stages an INSERT. Column order follows `data`; a repeated column
    /// overwrites the earlier value in place.
    #[must_use]
    pub fn insert<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        self.action = Action::Insert;
        self.insert_data = ordered_map(data);
        self
    }

    /// Stages an UPDATE of the rows matched by the current conditions.
    #[must_use]
    pub fn update<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        self.action = Action::Update;
        self.update_data = ordered_map(data);
        self
    }

    /// Stages a DELETE of the rows matched by the current conditions.
    #[must_use]
    pub const fn delete(mut self) -> Self {
        self.action = Action::Delete;
        self
    }

    /// Returns the bindings in placeholder order for the staged action.
    #[must_use]
    pub fn bindings(&self) -> Vec<SqlValue> {
        match self.action {
            Action::Insert => self.insert_data.iter().map(|(_, v)| v.clone()).collect(),
            Action::Update => self
                .update_data
                .iter()
                .map(|(_, v)| v.clone())
                .chain(self.where_bindings.iter().cloned())
                .collect(),
            Action::Select | Action::Delete => self.where_bindings.clone(),
            Action::Create | Action::Alter | Action::Drop | Action::Truncate => Vec::new(),
        }
    }

    // ----- execution -----

    /// Compiles and runs the staged statement, consuming the builder.
    pub async fn execute(self) -> Result<ExecutionOutcome> {
        let sql = self.to_sql()?;
        self.run(&sql).await
    }

    /// Runs explicit SQL with the staged bindings, consuming the builder.
    pub async fn execute_sql(self, sql: &str) -> Result<ExecutionOutcome> {
        self.run(sql).await
    }

    async fn run(self, sql: &str) -> Result<ExecutionOutcome> {
        let bindings = self.bindings();
        debug!(sql = %sql, bindings = bindings.len(), action = self.action.as_str(), "Executing statement");

        let result = self.connection.execute_query(sql, &bindings).await?;
        if self.action.returns_rows() {
            Ok(ExecutionOutcome::Rows(result.rows))
        } else {
            Ok(ExecutionOutcome::Affected {
                row_count: result.row_count,
                last_insert_id: result.last_insert_id,
            })
        }
    }

    /// Runs the staged conditions as a SELECT and returns all rows.
    pub async fn get(mut self) -> Result<Vec<Row>> {
        self.action = Action::Select;
        Ok(self.execute().await?.into_rows())
    }

    /// Runs the staged conditions as a SELECT limited to one row.
    pub async fn first(self) -> Result<Option<Row>> {
        Ok(self.limit(1).get().await?.into_iter().next())
    }

    // ----- aggregates -----

    /// Returns `COUNT(column)` over the matched rows, ignoring grouping,
    /// ordering and pagination.
    pub async fn count(&self, column: &str) -> Result<i64> {
        Ok(self
            .aggregate("COUNT", column)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }

    /// Returns `SUM(column)`.
    pub async fn sum(&self, column: &str) -> Result<Option<SqlValue>> {
        self.aggregate("SUM", column).await
    }

    /// Returns `AVG(column)`.
    pub async fn avg(&self, column: &str) -> Result<Option<SqlValue>> {
        self.aggregate("AVG", column).await
    }

    /// Returns `MIN(column)`.
    pub async fn min(&self, column: &str) -> Result<Option<SqlValue>> {
        self.aggregate("MIN", column).await
    }

    /// Returns `MAX(column)`.
    pub async fn max(&self, column: &str) -> Result<Option<SqlValue>> {
        self.aggregate("MAX", column).await
    }

    /// Builds the aggregate query on a stripped clone; `self` is untouched.
    fn aggregate_query(&self, function: &str, column: &str) -> Self {
        let mut query = self.clone();
        query.action = Action::Select;
        query.group_by = None;
        query.orders.clear();
        query.limit = None;
        query.offset = None;
        query.columns = vec![format!("{function}({column}) AS aggregate")];
        query
    }

    async fn aggregate(&self, function: &str, column: &str) -> Result<Option<SqlValue>> {
        let rows = self.aggregate_query(function, column).get().await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get("aggregate").cloned())
            .filter(|value| !value.is_null()))
    }

    // ----- DDL -----

    /// Stages a CREATE TABLE from rendered column definitions.
    #[must_use]
    pub fn create_table<I, C>(mut self, table: &str, columns: I, options: TableOptions) -> Self
    where
        I: IntoIterator<Item = C>,
        C: ToString,
    {
        self.action = Action::Create;
        self.table = String::from(table);
        self.create_columns = columns.into_iter().map(|c| c.to_string()).collect();
        self.table_options = options;
        self
    }

    /// Stages an ALTER TABLE.
    #[must_use]
    pub fn alter_table(mut self, table: &str) -> Self {
        self.action = Action::Alter;
        self.table = String::from(table);
        self
    }

    /// Adds a column to the staged ALTER TABLE.
    #[must_use]
    pub fn add_column(mut self, column: impl ToString) -> Self {
        self.alter_added.push(column.to_string());
        self
    }

    /// Modifies a column in the staged ALTER TABLE.
    #[must_use]
    pub fn modify_column(mut self, column: impl ToString) -> Self {
        self.alter_modified.push(column.to_string());
        self
    }

    /// Drops a column in the staged ALTER TABLE.
    #[must_use]
    pub fn drop_column(mut self, column: &str) -> Self {
        self.alter_dropped.push(String::from(column));
        self
    }

    /// Stages a DROP TABLE.
    #[must_use]
    pub fn drop_table(mut self, table: &str) -> Self {
        self.action = Action::Drop;
        self.table = String::from(table);
        self.drop_if_exists = false;
        self
    }

    /// Stages a DROP TABLE IF EXISTS.
    #[must_use]
    pub fn drop_table_if_exists(mut self, table: &str) -> Self {
        self.action = Action::Drop;
        self.table = String::from(table);
        self.drop_if_exists = true;
        self
    }

    /// Stages a TRUNCATE (a `DELETE FROM` on SQLite).
    #[must_use]
    pub fn truncate(mut self, table: &str) -> Self {
        self.action = Action::Truncate;
        self.table = String::from(table);
        self
    }

    // ----- column factories -----

    /// Returns a column of an abstract type compiled by the grammar.
    pub fn column_of_type(
        &self,
        name: &str,
        column_type: impl Into<ColumnType>,
        params: &[u32],
    ) -> ColumnBuilder {
        let sql_type = self
            .grammar
            .compile_column_type(&column_type.into(), params);
        ColumnBuilder::new(name, sql_type, Arc::clone(&self.grammar))
    }

    /// Auto-incrementing unsigned integer primary key.
    #[must_use]
    pub fn id(&self, name: &str) -> ColumnBuilder {
        let mut column = self.integer(name);
        column.unsigned().not_null().auto_increment().primary_key();
        column
    }

    /// `STRING` column of the given length.
    #[must_use]
    pub fn string(&self, name: &str, length: u32) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::String, &[length])
    }

    /// `INTEGER` column.
    #[must_use]
    pub fn integer(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Integer, &[])
    }

    /// `BIGINT` column.
    #[must_use]
    pub fn big_integer(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::BigInteger, &[])
    }

    /// `TINYINT` column.
    #[must_use]
    pub fn tiny_integer(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::TinyInteger, &[])
    }

    /// `TEXT` column.
    #[must_use]
    pub fn text(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Text, &[])
    }

    /// `BOOLEAN` column.
    #[must_use]
    pub fn boolean(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Boolean, &[])
    }

    /// `FLOAT` column.
    #[must_use]
    pub fn float(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Float, &[])
    }

    /// `DECIMAL(precision, scale)` column.
    #[must_use]
    pub fn decimal(&self, name: &str, precision: u32, scale: u32) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Decimal, &[precision, scale])
    }

    /// `DATE` column.
    #[must_use]
    pub fn date(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Date, &[])
    }

    /// `DATETIME` column.
    #[must_use]
    pub fn date_time(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::DateTime, &[])
    }

    /// `TIMESTAMP` column.
    #[must_use]
    pub fn timestamp(&self, name: &str) -> ColumnBuilder {
        self.column_of_type(name, ColumnType::Timestamp, &[])
    }

    /// Unsigned integer column matching the type of [`id`](Self::id).
    #[must_use]
    pub fn foreign_id(&self, name: &str) -> ColumnBuilder {
        let mut column = self.integer(name);
        column.unsigned();
        column
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("grammar", &self.grammar.name())
            .field("action", &self.action)
            .field("table", &self.table)
            .field("wheres", &self.wheres)
            .field("bindings", &self.bindings())
            .finish_non_exhaustive()
    }
}

/// Collects `(key, value)` pairs, keeping first-seen order and the last value.
fn ordered_map<I, K, V>(data: I) -> Vec<(String, SqlValue)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToSqlValue,
{
    let mut map: Vec<(String, SqlValue)> = Vec::new();
    for (key, value) in data {
        let key = key.into();
        let value = value.to_sql_value();
        match map.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => map.push((key, value)),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::QueryResult;
    use crate::grammar::{MySqlGrammar, PostgresGrammar};
    use async_trait::async_trait;

    struct NoopConnection;

    #[async_trait]
    impl Connection for NoopConnection {
        fn driver(&self) -> &str {
            "mysql"
        }

        async fn execute_query(&self, _sql: &str, _bindings: &[SqlValue]) -> Result<QueryResult> {
            Ok(QueryResult::default())
        }

        async fn begin_transaction(&self) -> Result<()> {
            Ok(())
        }

        async fn commit(&self) -> Result<()> {
            Ok(())
        }

        async fn rollback(&self) -> Result<()> {
            Ok(())
        }
    }

    fn builder() -> QueryBuilder {
        QueryBuilder::new(Arc::new(NoopConnection), Arc::new(MySqlGrammar::new("")))
    }

    #[test]
    fn test_default_action_is_select_star() {
        let q = builder().table("users");
        assert_eq!(q.action(), Action::Select);
        assert_eq!(q.to_sql().unwrap(), "SELECT * FROM users");
    }

    #[test]
    fn test_where_connectives() {
        let q = builder()
            .table("t")
            .where_("a", "=", 1)
            .where_with("b", ">", 2, Boolean::Or);
        assert_eq!(q.to_sql().unwrap(), "SELECT * FROM t WHERE a = ? OR b > ?");
        assert_eq!(q.bindings(), vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_where_in_binds_before_later_conditions() {
        let q = builder()
            .table("t")
            .where_in("id", [1, 2, 3])
            .where_("status", "=", "open")
            .where_null("deleted_at");
        assert_eq!(
            q.to_sql().unwrap(),
            "SELECT * FROM t WHERE id IN (?, ?, ?) AND status = ? AND deleted_at IS NULL"
        );
        assert_eq!(
            q.bindings(),
            vec![
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3),
                SqlValue::Text("open".into())
            ]
        );
    }

    #[test]
    fn test_update_binds_set_then_where() {
        let q = builder()
            .table("users")
            .where_("id", "=", 9)
            .update([("name", "ada"), ("role", "admin")]);
        assert_eq!(
            q.to_sql().unwrap(),
            "UPDATE users SET name = ?, role = ? WHERE id = ?"
        );
        assert_eq!(
            q.bindings(),
            vec![
                SqlValue::Text("ada".into()),
                SqlValue::Text("admin".into()),
                SqlValue::Int(9)
            ]
        );
    }

    #[test]
    fn test_insert_duplicate_key_overwrites_in_place() {
        let q = builder()
            .table("t")
            .insert([("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(q.to_sql().unwrap(), "INSERT INTO t (a, b) VALUES (?, ?)");
        assert_eq!(q.bindings(), vec![SqlValue::Int(3), SqlValue::Int(2)]);
    }

    #[test]
    fn test_last_action_wins() {
        let q = builder().table("t").insert([("a", 1)]).delete();
        assert_eq!(q.to_sql().unwrap(), "DELETE FROM t");
    }

    #[test]
    fn test_full_select_shape() {
        let q = builder()
            .select(["users.id", "posts.title"])
            .table("users")
            .join("posts", "users.id", "=", "posts.user_id")
            .left_join("tags", "posts.id", "=", "tags.post_id")
            .where_not_null("posts.published_at")
            .group_by("users.id")
            .order_by("users.id", "desc")
            .order_by("posts.title", "whatever")
            .limit(10)
            .offset(20);
        assert_eq!(
            q.to_sql().unwrap(),
            "SELECT users.id, posts.title FROM users \
             INNER JOIN posts ON users.id = posts.user_id \
             LEFT JOIN tags ON posts.id = tags.post_id \
             WHERE posts.published_at IS NOT NULL GROUP BY users.id \
             ORDER BY users.id DESC, posts.title ASC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_aggregate_query_strips_pagination() {
        let q = builder()
            .table("orders")
            .where_("status", "=", "paid")
            .group_by("customer_id")
            .order_by("total", "desc")
            .limit(5)
            .offset(10);
        let agg = q.aggregate_query("SUM", "total");
        assert_eq!(
            agg.to_sql().unwrap(),
            "SELECT SUM(total) AS aggregate FROM orders WHERE status = ?"
        );
        assert_eq!(
            q.to_sql().unwrap(),
            "SELECT * FROM orders WHERE status = ? GROUP BY customer_id ORDER BY total DESC LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn test_postgres_wraps_dml_identifiers() {
        let q = QueryBuilder::new(Arc::new(NoopConnection), Arc::new(PostgresGrammar::new("")))
            .table("users")
            .insert([("name", "ada")]);
        assert_eq!(
            q.to_sql().unwrap(),
            "INSERT INTO \"users\" (\"name\") VALUES (?)"
        );
    }

    #[test]
    fn test_missing_table_and_empty_insert_are_compile_errors() {
        assert!(builder().to_sql().is_err());
        let err = builder()
            .table("t")
            .insert(Vec::<(&str, i32)>::new())
            .to_sql()
            .unwrap_err();
        assert_eq!(err.code(), 1002);
    }

    #[test]
    fn test_column_factories() {
        let q = builder();
        assert_eq!(
            q.id("id").to_string(),
            "id INTEGER UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"
        );
        assert_eq!(q.string("name", 100).to_string(), "name VARCHAR(100)");
        assert_eq!(q.decimal("price", 10, 2).to_string(), "price DECIMAL(10,2)");
        assert_eq!(q.foreign_id("user_id").to_string(), "user_id INTEGER UNSIGNED");
        assert_eq!(
            q.column_of_type("payload", "json", &[]).to_string(),
            "payload JSON"
        );
        assert_eq!(q.action(), Action::Select);
    }

    #[test]
    fn test_ddl_actions() {
        let q = builder();
        let create = q.fresh().create_table(
            "users",
            [q.id("id"), q.string("name", 100)],
            TableOptions::default(),
        );
        assert_eq!(
            create.to_sql().unwrap(),
            "CREATE TABLE IF NOT EXISTS users (id INTEGER UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, name VARCHAR(100))"
        );
        assert_eq!(
            q.fresh().drop_table_if_exists("users").to_sql().unwrap(),
            "DROP TABLE IF EXISTS users"
        );
        assert_eq!(
            q.fresh().truncate("users").to_sql().unwrap(),
            "TRUNCATE TABLE users"
        );
        let alter = q
            .fresh()
            .alter_table("users")
            .add_column(q.integer("age"))
            .drop_column("nickname");
        assert_eq!(
            alter.to_sql().unwrap(),
            "ALTER TABLE users ADD COLUMN age INTEGER, DROP COLUMN nickname"
        );
    }
}
