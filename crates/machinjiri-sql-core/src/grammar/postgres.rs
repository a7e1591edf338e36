//! PostgreSQL grammar.

use super::{first_param, precision_scale, ColumnType, Grammar, TableOptions};

/// PostgreSQL grammar: double-quoted identifiers, no auto-increment keyword.
#[derive(Debug, Clone, Default)]
pub struct PostgresGrammar {
    table_prefix: String,
}

impl PostgresGrammar {
    /// Creates a PostgreSQL grammar with the given table prefix.
    #[must_use]
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into(),
        }
    }
}

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_table(&self, table: &str) -> String {
        format!("\"{}{}\"", self.table_prefix, table)
    }

    fn wrap_column(&self, column: &str) -> String {
        format!("\"{column}\"")
    }

    fn compile_column_type(&self, column_type: &ColumnType, params: &[u32]) -> String {
        match column_type {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::TinyInteger => "SMALLINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::String => format!("VARCHAR({})", first_param(params).unwrap_or(255)),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Decimal => {
                let (p, s) = precision_scale(params).unwrap_or((8, 2));
                format!("NUMERIC({p},{s})")
            }
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Other(name) => name.clone(),
        }
    }

    /// PostgreSQL has no column keyword for auto-increment; identity and
    /// serial columns are not generated, so this is the empty string.
    fn compile_auto_increment(&self) -> &'static str {
        ""
    }

    fn compile_table_options(&self, options: &TableOptions) -> String {
        options
            .pairs()
            .into_iter()
            .filter(|(key, _)| *key != "ENGINE")
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_types() {
        let g = PostgresGrammar::new("");
        assert_eq!(g.compile_column_type(&ColumnType::DateTime, &[]), "TIMESTAMP");
        assert_eq!(g.compile_column_type(&ColumnType::Integer, &[11]), "INTEGER");
        assert_eq!(g.compile_column_type(&ColumnType::TinyInteger, &[4]), "SMALLINT");
        assert_eq!(g.compile_column_type(&ColumnType::Float, &[8, 2]), "REAL");
        assert_eq!(g.compile_column_type(&ColumnType::Decimal, &[10, 3]), "NUMERIC(10,3)");
        assert_eq!(g.compile_column_type(&ColumnType::Decimal, &[]), "NUMERIC(8,2)");
    }

    #[test]
    fn test_quoted_identifiers() {
        let g = PostgresGrammar::new("app_");
        assert_eq!(g.wrap_table("users"), "\"app_users\"");
        assert_eq!(g.wrap_column("email"), "\"email\"");
    }

    #[test]
    fn test_auto_increment_is_empty() {
        assert_eq!(PostgresGrammar::new("").compile_auto_increment(), "");
    }

    #[test]
    fn test_engine_option_dropped() {
        let g = PostgresGrammar::new("");
        let options = TableOptions {
            engine: Some("InnoDB".into()),
            ..TableOptions::default()
        };
        assert_eq!(g.compile_table_options(&options), "");
        let sql = g.compile_create_table("users", &["\"id\" INTEGER".to_string()], &options);
        assert_eq!(sql, "CREATE TABLE IF NOT EXISTS \"users\" (\"id\" INTEGER)");
    }

    #[test]
    fn test_modify_column_is_unsupported() {
        let g = PostgresGrammar::new("");
        let err = g
            .compile_alter_table("users", &[], &["\"name\" TEXT".to_string()], &[])
            .unwrap_err();
        assert_eq!(err.code(), 1004);
    }
}
