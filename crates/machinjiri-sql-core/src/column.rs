//! Column definition builder.
//!
//! A [`ColumnBuilder`] holds one column's evolving definition and renders the
//! DDL fragment through [`fmt::Display`]. The modifier order is fixed and
//! dialect-aware:
//!
//! ```text
//! name TYPE [UNSIGNED] [NOT NULL|NULL] [DEFAULT v] [AUTO_INCREMENT] [PRIMARY KEY] [UNIQUE] [COMMENT '..']
//! ```
//!
//! SQLite moves `AUTOINCREMENT` behind `PRIMARY KEY`; `UNSIGNED` and `COMMENT`
//! are only rendered where the grammar supports them.

use std::fmt;
use std::sync::Arc;

use crate::grammar::Grammar;
use crate::value::{SqlValue, ToSqlValue};

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Literal value, rendered escaped.
    Value(SqlValue),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Value(value) => value.to_sql_inline(),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Fluent builder for a single column definition.
///
/// No validation is done on conflicting modifiers: for mutually exclusive
/// pairs such as [`nullable`](Self::nullable) and
/// [`not_null`](Self::not_null) the last call wins.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    sql_type: String,
    grammar: Arc<dyn Grammar>,
    nullable: Option<bool>,
    default: Option<DefaultValue>,
    primary_key: bool,
    unsigned: bool,
    unique: bool,
    auto_increment: bool,
    comment: Option<String>,
}

impl ColumnBuilder {
    /// Creates a column from an already compiled SQL type.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sql_type: impl Into<String>,
        grammar: Arc<dyn Grammar>,
    ) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            grammar,
            nullable: None,
            default: None,
            primary_key: false,
            unsigned: false,
            unique: false,
            auto_increment: false,
            comment: None,
        }
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled SQL type.
    #[must_use]
    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    /// Returns whether the column is part of an inline primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Returns the default, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Marks the column as `NULL`.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = Some(true);
        self
    }

    /// Marks the column as `NOT NULL`.
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = Some(false);
        self
    }

    /// Sets a literal default value.
    pub fn default(&mut self, value: impl ToSqlValue) -> &mut Self {
        self.default = Some(DefaultValue::Value(value.to_sql_value()));
        self
    }

    /// Sets a raw SQL expression as default.
    pub fn default_raw(&mut self, expr: impl Into<String>) -> &mut Self {
        self.default = Some(DefaultValue::Expression(expr.into()));
        self
    }

    /// Marks the column as `PRIMARY KEY`.
    pub fn primary_key(&mut self) -> &mut Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as `UNSIGNED`.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Marks the column as `UNIQUE`.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Adds the dialect's auto-increment keyword.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Sets a column comment.
    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.comment = Some(text.into());
        self
    }
}

impl fmt::Display for ColumnBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grammar = &self.grammar;
        let mut parts = vec![grammar.wrap_column(&self.name), self.sql_type.clone()];

        if self.unsigned && grammar.supports_unsigned() {
            parts.push("UNSIGNED".to_string());
        }

        match self.nullable {
            Some(false) => parts.push("NOT NULL".to_string()),
            Some(true) => parts.push("NULL".to_string()),
            None => {}
        }

        if let Some(ref default) = self.default {
            parts.push(format!("DEFAULT {}", default.to_sql()));
        }

        let keyword = grammar.compile_auto_increment();
        let auto_increment = self.auto_increment && !keyword.is_empty();
        let after_primary_key = grammar.auto_increment_after_primary_key();

        if auto_increment && !after_primary_key {
            parts.push(keyword.to_string());
        }
        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if auto_increment && after_primary_key {
            parts.push(keyword.to_string());
        }
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        if let Some(comment) = self
            .comment
            .as_deref()
            .and_then(|c| grammar.compile_column_comment(c))
        {
            parts.push(comment);
        }

        f.write_str(&parts.join(" "))
    }
}
