//! SQL compilation for each builder action.

use super::{Action, QueryBuilder};
use crate::error::{DbError, Result};
use crate::query::clause::placeholders;

impl QueryBuilder {
    /// Compiles the staged state into SQL, dispatching on the action.
    pub fn to_sql(&self) -> Result<String> {
        match self.action {
            Action::Select => self.compile_select(),
            Action::Insert => self.compile_insert(),
            Action::Update => self.compile_update(),
            Action::Delete => self.compile_delete(),
            Action::Create => self.compile_create(),
            Action::Alter => self.grammar.compile_alter_table(
                self.require_table()?,
                &self.alter_added,
                &self.alter_modified,
                &self.alter_dropped,
            ),
            Action::Drop => Ok(self
                .grammar
                .compile_drop_table(self.require_table()?, self.drop_if_exists)),
            Action::Truncate => Ok(self.grammar.compile_truncate_table(self.require_table()?)),
        }
    }

    fn require_table(&self) -> Result<&str> {
        if self.table.is_empty() {
            return Err(DbError::Compilation(format!(
                "no table set for {} statement",
                self.action.as_str()
            )));
        }
        Ok(&self.table)
    }

    fn compile_select(&self) -> Result<String> {
        let table = self.grammar.wrap_table(self.require_table()?);
        let columns = if self.columns.is_empty() {
            String::from("*")
        } else {
            self.columns.join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {table}");
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        sql.push_str(&self.compile_wheres());
        if let Some(ref column) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(column);
        }
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(column, direction)| format!("{column} {}", direction.as_str()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }

    fn compile_insert(&self) -> Result<String> {
        let table = self.grammar.wrap_table(self.require_table()?);
        if self.insert_data.is_empty() {
            return Err(DbError::Compilation(format!(
                "INSERT INTO {table} has no values"
            )));
        }
        let columns: Vec<String> = self
            .insert_data
            .iter()
            .map(|(column, _)| self.grammar.wrap_column(column))
            .collect();
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders(columns.len())
        ))
    }

    fn compile_update(&self) -> Result<String> {
        let table = self.grammar.wrap_table(self.require_table()?);
        if self.update_data.is_empty() {
            return Err(DbError::Compilation(format!(
                "UPDATE {table} has no assignments"
            )));
        }
        let sets: Vec<String> = self
            .update_data
            .iter()
            .map(|(column, _)| format!("{} = ?", self.grammar.wrap_column(column)))
            .collect();
        Ok(format!(
            "UPDATE {table} SET {}{}",
            sets.join(", "),
            self.compile_wheres()
        ))
    }

    fn compile_delete(&self) -> Result<String> {
        let table = self.grammar.wrap_table(self.require_table()?);
        Ok(format!("DELETE FROM {table}{}", self.compile_wheres()))
    }

    fn compile_create(&self) -> Result<String> {
        let table = self.require_table()?;
        if self.create_columns.is_empty() {
            return Err(DbError::Compilation(format!(
                "CREATE TABLE {table} has no columns"
            )));
        }
        Ok(self
            .grammar
            .compile_create_table(table, &self.create_columns, &self.table_options))
    }

    /// Renders the WHERE clause with a leading space, or an empty string.
    fn compile_wheres(&self) -> String {
        let mut sql = String::new();
        for (i, clause) in self.wheres.iter().enumerate() {
            if i == 0 {
                sql.push_str(" WHERE ");
            } else {
                sql.push(' ');
                sql.push_str(clause.boolean().as_str());
                sql.push(' ');
            }
            sql.push_str(&clause.to_sql());
        }
        sql
    }
}
