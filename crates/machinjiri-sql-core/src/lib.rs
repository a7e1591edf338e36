//! # machinjiri-sql-core
//!
//! Dialect-aware SQL generation with a fluent construction API.
//!
//! This crate provides:
//! - A [`Grammar`] per database engine (MySQL, PostgreSQL, SQLite) that
//!   compiles abstract column types and DDL skeletons
//! - A [`QueryBuilder`] that stages one statement and binds every value as a
//!   positional `?` parameter
//! - A [`Blueprint`] schema DSL producing CREATE/ALTER/DROP statements
//! - The [`Connection`] contract and the [`Database`] provider that ties a
//!   connection to its grammar
//!
//! ## Querying
//!
//! ```rust,ignore
//! use machinjiri_sql_core::Database;
//!
//! let db = Database::new(connection)?;
//! let admins = db
//!     .table("users")
//!     .where_("role", "=", "admin")
//!     .order_by("name", "asc")
//!     .get()
//!     .await?;
//!
//! let total = db.table("orders").where_("paid", "=", true).count("*").await?;
//! ```
//!
//! ## Defining tables
//!
//! ```rust,ignore
//! let mut table = db.create("users");
//! table.id("id");
//! table.string("email", 190).not_null();
//! table.unique(&["email"]);
//! table.timestamps();
//! table.build().await?;
//! ```

pub mod blueprint;
pub mod column;
pub mod connection;
pub mod error;
pub mod grammar;
pub mod query;
pub mod value;

pub use blueprint::{Blueprint, BlueprintAction, ColumnTypeRegistry, ForeignKeyDefinition};
pub use column::{ColumnBuilder, DefaultValue};
pub use connection::{Connection, Database, QueryResult, Row};
pub use error::{DbError, ErrorKind, Result};
pub use grammar::{
    grammar_for_driver, ColumnType, Grammar, IndexKind, MySqlGrammar, PostgresGrammar,
    SqliteGrammar, TableOptions,
};
pub use query::{Action, Boolean, ExecutionOutcome, QueryBuilder};
pub use value::{SqlValue, ToSqlValue};
