//! MySQL grammar.

use super::{first_param, precision_scale, ColumnType, Grammar, IndexKind, TableOptions};
use crate::error::Result;

/// Length MySQL reports for a plain `INT`; treated as "no explicit length".
const DEFAULT_INT_LENGTH: u32 = 11;

/// MySQL grammar: unquoted identifiers, `AUTO_INCREMENT`, `KEY=VALUE` options.
#[derive(Debug, Clone, Default)]
pub struct MySqlGrammar {
    table_prefix: String,
}

impl MySqlGrammar {
    /// Creates a MySQL grammar with the given table prefix.
    #[must_use]
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into(),
        }
    }
}

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn compile_column_type(&self, column_type: &ColumnType, params: &[u32]) -> String {
        match column_type {
            ColumnType::Integer => match first_param(params) {
                None | Some(DEFAULT_INT_LENGTH) => "INTEGER".to_string(),
                Some(n) => format!("INT({n})"),
            },
            ColumnType::BigInteger => match first_param(params) {
                Some(n) => format!("BIGINT({n})"),
                None => "BIGINT".to_string(),
            },
            ColumnType::TinyInteger => format!("TINYINT({})", first_param(params).unwrap_or(4)),
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::String => format!("VARCHAR({})", first_param(params).unwrap_or(255)),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Float => match precision_scale(params) {
                Some((p, s)) => format!("FLOAT({p},{s})"),
                None => "FLOAT".to_string(),
            },
            ColumnType::Decimal => match (precision_scale(params), first_param(params)) {
                (Some((p, s)), _) => format!("DECIMAL({p},{s})"),
                (None, Some(p)) => format!("DECIMAL({p})"),
                (None, None) => "DECIMAL".to_string(),
            },
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Other(name) => name.clone(),
        }
    }

    fn compile_auto_increment(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn supports_unsigned(&self) -> bool {
        true
    }

    fn compile_column_comment(&self, comment: &str) -> Option<String> {
        Some(format!("COMMENT '{}'", comment.replace('\'', "''")))
    }

    fn compile_table_options(&self, options: &TableOptions) -> String {
        options
            .pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn compile_modify_column(&self, column_def: &str) -> Option<String> {
        Some(format!("MODIFY COLUMN {column_def}"))
    }

    fn compile_inline_index(
        &self,
        kind: IndexKind,
        name: &str,
        columns: &[String],
    ) -> Option<String> {
        let keyword = match kind {
            IndexKind::Index => "INDEX",
            IndexKind::Unique => "UNIQUE INDEX",
            IndexKind::Fulltext => "FULLTEXT INDEX",
            IndexKind::Spatial => "SPATIAL INDEX",
        };
        Some(format!("{keyword} {name} ({})", columns.join(", ")))
    }

    fn compile_create_index(
        &self,
        kind: IndexKind,
        name: &str,
        table: &str,
        columns: &[String],
    ) -> Result<String> {
        let modifier = match kind {
            IndexKind::Index => "",
            IndexKind::Unique => "UNIQUE ",
            IndexKind::Fulltext => "FULLTEXT ",
            IndexKind::Spatial => "SPATIAL ",
        };
        Ok(format!(
            "CREATE {modifier}INDEX {name} ON {} ({})",
            self.wrap_table(table),
            columns.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_length_sentinel() {
        let g = MySqlGrammar::new("");
        assert_eq!(g.compile_column_type(&ColumnType::Integer, &[11]), "INTEGER");
        assert_eq!(g.compile_column_type(&ColumnType::Integer, &[]), "INTEGER");
        assert_eq!(g.compile_column_type(&ColumnType::Integer, &[10]), "INT(10)");
    }

    #[test]
    fn test_mysql_types() {
        let g = MySqlGrammar::new("");
        assert_eq!(g.compile_column_type(&ColumnType::TinyInteger, &[2]), "TINYINT(2)");
        assert_eq!(g.compile_column_type(&ColumnType::Boolean, &[]), "TINYINT(1)");
        assert_eq!(g.compile_column_type(&ColumnType::Float, &[]), "FLOAT");
        assert_eq!(g.compile_column_type(&ColumnType::Float, &[8, 2]), "FLOAT(8,2)");
        assert_eq!(g.compile_column_type(&ColumnType::Decimal, &[10, 2]), "DECIMAL(10,2)");
        assert_eq!(g.compile_column_type(&ColumnType::Decimal, &[]), "DECIMAL");
        assert_eq!(g.compile_column_type(&ColumnType::DateTime, &[]), "DATETIME");
    }

    #[test]
    fn test_prefix_and_unquoted_identifiers() {
        let g = MySqlGrammar::new("app_");
        assert_eq!(g.wrap_table("users"), "app_users");
        assert_eq!(g.wrap_column("email"), "email");
    }

    #[test]
    fn test_create_table_with_options() {
        let g = MySqlGrammar::new("");
        let options = TableOptions {
            engine: Some("InnoDB".into()),
            charset: Some("utf8mb4".into()),
            ..TableOptions::default()
        };
        let sql = g.compile_create_table(
            "users",
            &["id INTEGER".to_string(), "name VARCHAR(100)".to_string()],
            &options,
        );
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS users (id INTEGER, name VARCHAR(100)) ENGINE=InnoDB CHARSET=utf8mb4"
        );
    }

    #[test]
    fn test_alter_with_modify() {
        let g = MySqlGrammar::new("");
        let sql = g
            .compile_alter_table(
                "users",
                &["age INTEGER".to_string()],
                &["name VARCHAR(50)".to_string()],
                &["nickname".to_string()],
            )
            .unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE users ADD COLUMN age INTEGER, MODIFY COLUMN name VARCHAR(50), DROP COLUMN nickname"
        );
    }

    #[test]
    fn test_inline_index() {
        let g = MySqlGrammar::new("");
        assert_eq!(
            g.compile_inline_index(
                IndexKind::Fulltext,
                "fulltext_posts_body",
                &["body".to_string()]
            )
            .as_deref(),
            Some("FULLTEXT INDEX fulltext_posts_body (body)")
        );
    }

    #[test]
    fn test_create_fulltext_and_spatial_index() {
        let g = MySqlGrammar::new("app_");
        assert_eq!(
            g.compile_create_index(
                IndexKind::Fulltext,
                "fulltext_posts_body",
                "posts",
                &["body".to_string()]
            )
            .unwrap(),
            "CREATE FULLTEXT INDEX fulltext_posts_body ON app_posts (body)"
        );
        assert_eq!(
            g.compile_create_index(IndexKind::Spatial, "spatial_places_at", "places", &["at".to_string()])
                .unwrap(),
            "CREATE SPATIAL INDEX spatial_places_at ON app_places (at)"
        );
    }
}
