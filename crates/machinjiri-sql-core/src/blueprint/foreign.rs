//! Foreign key definitions and naming.

use crate::error::{DbError, Result};
use crate::grammar::Grammar;

/// A foreign key staged on a blueprint.
///
/// The referenced table defaults to one inferred from the column name and
/// the referenced column defaults to `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDefinition {
    column: String,
    references: String,
    on: Option<String>,
    on_delete: Option<String>,
    on_update: Option<String>,
    name: Option<String>,
}

impl ForeignKeyDefinition {
    /// Creates a foreign key on `column`.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            references: String::from("id"),
            on: None,
            on_delete: None,
            on_update: None,
            name: None,
        }
    }

    /// Sets the referenced column.
    pub fn references(&mut self, column: impl Into<String>) -> &mut Self {
        self.references = column.into();
        self
    }

    /// Sets the referenced table.
    pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
        self.on = Some(table.into());
        self
    }

    /// Sets the `ON DELETE` action (e.g. `CASCADE`).
    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_delete = Some(action.into().to_uppercase());
        self
    }

    /// Sets the `ON UPDATE` action.
    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_update = Some(action.into().to_uppercase());
        self
    }

    /// Overrides the generated constraint name.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the constrained column.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the referenced table, explicit or inferred.
    pub fn foreign_table(&self) -> Result<String> {
        match self.on {
            Some(ref table) => Ok(table.clone()),
            None => guess_table_name(&self.column),
        }
    }

    /// Returns the constraint name, explicit or `fk_{table}_{column}_{foreign}`.
    pub fn constraint_name(&self, table: &str) -> Result<String> {
        match self.name {
            Some(ref name) => Ok(name.clone()),
            None => Ok(format!(
                "fk_{table}_{}_{}",
                self.column,
                self.foreign_table()?
            )),
        }
    }

    /// Renders the `CONSTRAINT ... FOREIGN KEY ... REFERENCES ...` entry.
    pub fn to_sql(&self, table: &str, grammar: &dyn Grammar) -> Result<String> {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.constraint_name(table)?,
            grammar.wrap_column(&self.column),
            grammar.wrap_table(&self.foreign_table()?),
            grammar.wrap_column(&self.references)
        );
        if let Some(ref action) = self.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action);
        }
        if let Some(ref action) = self.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action);
        }
        Ok(sql)
    }
}

/// Infers a referenced table from a column name by stripping a trailing
/// `s_id`, or else `_id`.
///
/// The match is literal, so a singular stem that itself ends in `s` loses
/// that letter: `status_id` gives `statu` and `address_id` gives `addres`.
/// Name the table with [`ForeignKeyDefinition::on`] for such columns.
pub fn guess_table_name(column: &str) -> Result<String> {
    column
        .strip_suffix("s_id")
        .or_else(|| column.strip_suffix("_id"))
        .filter(|stem| !stem.is_empty())
        .map(String::from)
        .ok_or_else(|| DbError::ForeignTableInference {
            column: String::from(column),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{MySqlGrammar, PostgresGrammar};

    #[test]
    fn test_guess_table_name() {
        assert_eq!(guess_table_name("user_id").unwrap(), "user");
        assert_eq!(guess_table_name("users_id").unwrap(), "user");
        assert!(matches!(
            guess_table_name("owner").unwrap_err(),
            DbError::ForeignTableInference { .. }
        ));
        assert!(guess_table_name("_id").is_err());
    }

    #[test]
    fn test_stem_ending_in_s_needs_explicit_table() {
        assert_eq!(guess_table_name("status_id").unwrap(), "statu");
        assert_eq!(guess_table_name("address_id").unwrap(), "addres");

        let mut fk = ForeignKeyDefinition::new("status_id");
        fk.on("statuses");
        assert_eq!(fk.foreign_table().unwrap(), "statuses");
        assert_eq!(fk.constraint_name("orders").unwrap(), "fk_orders_status_id_statuses");
    }

    #[test]
    fn test_generated_name_and_actions() {
        let mut fk = ForeignKeyDefinition::new("author_id");
        fk.on("authors").on_delete("cascade");
        assert_eq!(
            fk.to_sql("posts", &MySqlGrammar::new("")).unwrap(),
            "CONSTRAINT fk_posts_author_id_authors FOREIGN KEY (author_id) REFERENCES authors (id) ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_explicit_name_and_quoting() {
        let mut fk = ForeignKeyDefinition::new("owner");
        fk.references("uuid").on("accounts").name("owner_fk").on_update("restrict");
        assert_eq!(
            fk.to_sql("pets", &PostgresGrammar::new("")).unwrap(),
            "CONSTRAINT owner_fk FOREIGN KEY (\"owner\") REFERENCES \"accounts\" (\"uuid\") ON UPDATE RESTRICT"
        );
    }

    #[test]
    fn test_inference_failure_surfaces_at_render() {
        let fk = ForeignKeyDefinition::new("owner");
        assert!(fk.to_sql("pets", &MySqlGrammar::new("")).is_err());
    }
}
