//! Dialect-specific SQL generation.
//!
//! A [`Grammar`] turns abstract column types and DDL shapes into the SQL text
//! of one database engine. Grammars are stateless apart from the table
//! prefix, so one instance is shared by every builder of a [`Database`].
//!
//! [`Database`]: crate::Database

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::sync::Arc;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use crate::error::{DbError, Result};

/// Abstract column type, compiled by a grammar into dialect SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// `INTEGER`
    Integer,
    /// `BIGINT`
    BigInteger,
    /// `TINYINT`
    TinyInteger,
    /// `STRING` (variable length character data)
    String,
    /// `TEXT`
    Text,
    /// `BOOLEAN`
    Boolean,
    /// `FLOAT`
    Float,
    /// `DECIMAL`
    Decimal,
    /// `DATE`
    Date,
    /// `DATETIME`
    DateTime,
    /// `TIMESTAMP`
    Timestamp,
    /// Any other type name, upper-cased and passed through untouched.
    Other(String),
}

impl ColumnType {
    /// Parses an abstract type token. Matching is case-insensitive and
    /// unknown names become [`ColumnType::Other`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        match upper.as_str() {
            "INTEGER" => Self::Integer,
            "BIGINT" => Self::BigInteger,
            "TINYINT" => Self::TinyInteger,
            "STRING" => Self::String,
            "TEXT" => Self::Text,
            "BOOLEAN" => Self::Boolean,
            "FLOAT" => Self::Float,
            "DECIMAL" => Self::Decimal,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            _ => Self::Other(upper),
        }
    }

    /// Returns the abstract token for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "INTEGER",
            Self::BigInteger => "BIGINT",
            Self::TinyInteger => "TINYINT",
            Self::String => "STRING",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for ColumnType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Plain index.
    Index,
    /// Unique index.
    Unique,
    /// Full-text index (MySQL).
    Fulltext,
    /// Spatial index (MySQL).
    Spatial,
}

impl IndexKind {
    /// Prefix used when generating index names.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Unique => "unique",
            Self::Fulltext => "fulltext",
            Self::Spatial => "spatial",
        }
    }
}

/// Table-level options of a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Emit `IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Emit `TEMPORARY`.
    pub temporary: bool,
    /// Storage engine (MySQL only).
    pub engine: Option<String>,
    /// Default character set.
    pub charset: Option<String>,
    /// Default collation.
    pub collation: Option<String>,
    /// Starting value of the auto-increment counter.
    pub auto_increment: Option<u64>,
    /// Table comment.
    pub comment: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            if_not_exists: true,
            temporary: false,
            engine: None,
            charset: None,
            collation: None,
            auto_increment: None,
            comment: None,
        }
    }
}

impl TableOptions {
    /// Returns the `KEY=VALUE` pairs that are set, in rendering order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref engine) = self.engine {
            pairs.push(("ENGINE", engine.clone()));
        }
        if let Some(ref charset) = self.charset {
            pairs.push(("CHARSET", charset.clone()));
        }
        if let Some(ref collation) = self.collation {
            pairs.push(("COLLATE", collation.clone()));
        }
        if let Some(start) = self.auto_increment {
            pairs.push(("AUTO_INCREMENT", start.to_string()));
        }
        if let Some(ref comment) = self.comment {
            pairs.push(("COMMENT", format!("'{}'", comment.replace('\'', "''"))));
        }
        pairs
    }
}

/// Dialect contract: identifier wrapping, type compilation and DDL skeletons.
pub trait Grammar: fmt::Debug + Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the table prefix applied by [`Grammar::wrap_table`].
    fn table_prefix(&self) -> &str;

    /// Prefixes and quotes a table name.
    fn wrap_table(&self, table: &str) -> String {
        format!("{}{}", self.table_prefix(), table)
    }

    /// Quotes a column name.
    fn wrap_column(&self, column: &str) -> String {
        column.to_string()
    }

    /// Compiles an abstract column type and its parameters into dialect SQL.
    fn compile_column_type(&self, column_type: &ColumnType, params: &[u32]) -> String;

    /// Returns the auto-increment keyword for this dialect.
    fn compile_auto_increment(&self) -> &'static str;

    /// Whether `UNSIGNED` is a valid column modifier.
    fn supports_unsigned(&self) -> bool {
        false
    }

    /// Whether the auto-increment keyword must follow `PRIMARY KEY`.
    fn auto_increment_after_primary_key(&self) -> bool {
        false
    }

    /// Renders an inline column comment, if the dialect has one.
    fn compile_column_comment(&self, _comment: &str) -> Option<String> {
        None
    }

    /// Renders the table options suffix of CREATE TABLE.
    fn compile_table_options(&self, options: &TableOptions) -> String;

    /// Compiles a CREATE TABLE statement from rendered column definitions.
    fn compile_create_table(
        &self,
        table: &str,
        column_defs: &[String],
        options: &TableOptions,
    ) -> String {
        let mut sql = String::from("CREATE ");
        if options.temporary {
            sql.push_str("TEMPORARY ");
        }
        sql.push_str("TABLE ");
        if options.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.wrap_table(table));
        sql.push_str(" (");
        sql.push_str(&column_defs.join(", "));
        sql.push(')');

        let suffix = self.compile_table_options(options);
        if !suffix.is_empty() {
            sql.push(' ');
            sql.push_str(&suffix);
        }
        sql
    }

    /// Renders one modified column clause, if the dialect can express it.
    fn compile_modify_column(&self, _column_def: &str) -> Option<String> {
        None
    }

    /// Compiles an ALTER TABLE statement.
    fn compile_alter_table(
        &self,
        table: &str,
        added: &[String],
        modified: &[String],
        dropped: &[String],
    ) -> Result<String> {
        let mut clauses: Vec<String> = added.iter().map(|c| format!("ADD COLUMN {c}")).collect();
        for def in modified {
            let clause = self.compile_modify_column(def).ok_or_else(|| {
                DbError::Unsupported(format!("{} cannot modify column '{def}'", self.name()))
            })?;
            clauses.push(clause);
        }
        clauses.extend(
            dropped
                .iter()
                .map(|c| format!("DROP COLUMN {}", self.wrap_column(c))),
        );

        if clauses.is_empty() {
            return Err(DbError::Compilation(format!(
                "ALTER TABLE {table} has no changes"
            )));
        }

        Ok(format!(
            "ALTER TABLE {} {}",
            self.wrap_table(table),
            clauses.join(", ")
        ))
    }

    /// Compiles a DROP TABLE statement.
    fn compile_drop_table(&self, table: &str, if_exists: bool) -> String {
        if if_exists {
            format!("DROP TABLE IF EXISTS {}", self.wrap_table(table))
        } else {
            format!("DROP TABLE {}", self.wrap_table(table))
        }
    }

    /// Compiles a TRUNCATE statement.
    fn compile_truncate_table(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {}", self.wrap_table(table))
    }

    /// Renders an index as a CREATE TABLE entry, when the dialect allows it.
    fn compile_inline_index(
        &self,
        _kind: IndexKind,
        _name: &str,
        _columns: &[String],
    ) -> Option<String> {
        None
    }

    /// Compiles a standalone CREATE INDEX statement.
    fn compile_create_index(
        &self,
        kind: IndexKind,
        name: &str,
        table: &str,
        columns: &[String],
    ) -> Result<String> {
        let unique = match kind {
            IndexKind::Index => "",
            IndexKind::Unique => "UNIQUE ",
            IndexKind::Fulltext | IndexKind::Spatial => {
                return Err(DbError::Unsupported(format!(
                    "{} indexes are not available on {}",
                    kind.prefix(),
                    self.name()
                )));
            }
        };
        let cols: Vec<String> = columns.iter().map(|c| self.wrap_column(c)).collect();
        Ok(format!(
            "CREATE {unique}INDEX {} ON {} ({})",
            self.wrap_column(name),
            self.wrap_table(table),
            cols.join(", ")
        ))
    }
}

/// Selects the grammar for a connection driver name.
pub fn grammar_for_driver(driver: &str, table_prefix: &str) -> Result<Arc<dyn Grammar>> {
    match driver.to_lowercase().as_str() {
        "mysql" | "mariadb" => Ok(Arc::new(MySqlGrammar::new(table_prefix))),
        "pgsql" | "postgres" | "postgresql" => Ok(Arc::new(PostgresGrammar::new(table_prefix))),
        "sqlite" | "sqlite3" => Ok(Arc::new(SqliteGrammar::new(table_prefix))),
        "" => Err(DbError::Configuration(String::from("database driver is not set"))),
        other => Err(DbError::Configuration(format!(
            "unsupported database driver: {other}"
        ))),
    }
}

/// Returns the first parameter, if any.
fn first_param(params: &[u32]) -> Option<u32> {
    params.first().copied()
}

/// Returns `(precision, scale)` when both are given.
fn precision_scale(params: &[u32]) -> Option<(u32, u32)> {
    match params {
        [p, s, ..] => Some((*p, *s)),
        _ => None,
    }
}
