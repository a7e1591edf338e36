//! SQLite grammar.

use super::{first_param, ColumnType, Grammar, TableOptions};
use crate::error::{DbError, Result};

/// SQLite grammar: type affinities, `AUTOINCREMENT`, no table options.
#[derive(Debug, Clone, Default)]
pub struct SqliteGrammar {
    table_prefix: String,
}

impl SqliteGrammar {
    /// Creates a SQLite grammar with the given table prefix.
    #[must_use]
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into(),
        }
    }
}

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn compile_column_type(&self, column_type: &ColumnType, params: &[u32]) -> String {
        // SQLite stores by affinity, so most families collapse to one name.
        match column_type {
            ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyInteger
            | ColumnType::Boolean => "INTEGER".to_string(),
            ColumnType::String => format!("VARCHAR({})", first_param(params).unwrap_or(255)),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Float | ColumnType::Decimal => "REAL".to_string(),
            ColumnType::Date | ColumnType::DateTime | ColumnType::Timestamp => "TEXT".to_string(),
            ColumnType::Other(name) => name.clone(),
        }
    }

    fn compile_auto_increment(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    fn auto_increment_after_primary_key(&self) -> bool {
        true
    }

    fn compile_table_options(&self, _options: &TableOptions) -> String {
        String::new()
    }

    /// SQLite accepts a single action per ALTER TABLE, so each change becomes
    /// its own statement in a `;`-separated batch.
    fn compile_alter_table(
        &self,
        table: &str,
        added: &[String],
        modified: &[String],
        dropped: &[String],
    ) -> Result<String> {
        if let Some(def) = modified.first() {
            return Err(DbError::Unsupported(format!(
                "sqlite cannot modify column '{def}'"
            )));
        }
        let table = self.wrap_table(table);
        let statements: Vec<String> = added
            .iter()
            .map(|def| format!("ALTER TABLE {table} ADD COLUMN {def}"))
            .chain(
                dropped
                    .iter()
                    .map(|col| format!("ALTER TABLE {table} DROP COLUMN {col}")),
            )
            .collect();
        if statements.is_empty() {
            return Err(DbError::Compilation(format!(
                "ALTER TABLE {table} has no changes"
            )));
        }
        Ok(statements.join("; "))
    }

    fn compile_truncate_table(&self, table: &str) -> String {
        format!("DELETE FROM {}", self.wrap_table(table))
    }
}
