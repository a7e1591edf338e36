//! Schema definition DSL.
//!
//! A [`Blueprint`] collects the definition (or alteration) of one table and
//! compiles it into one or more DDL statements. Constraints ride along the
//! CREATE TABLE column list as extra entries; indexes the dialect cannot
//! declare inline become follow-up `CREATE INDEX` statements.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut table = db.create("posts");
//! table.id("id");
//! table.string("title", 200).not_null();
//! table.foreign_id("author_id").not_null();
//! table.foreign("author_id").on("authors").on_delete("cascade");
//! table.index(&["title"]);
//! table.timestamps();
//! table.build().await?;
//! ```

mod composites;
mod foreign;
mod registry;

use std::sync::Arc;

use tracing::warn;

pub use foreign::{guess_table_name, ForeignKeyDefinition};
pub use registry::{ColumnFactory, ColumnTypeRegistry};

use crate::column::ColumnBuilder;
use crate::error::{DbError, Result};
use crate::grammar::{IndexKind, TableOptions};
use crate::query::QueryBuilder;

/// What [`Blueprint::build`] does with the collected definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlueprintAction {
    /// `CREATE TABLE`
    #[default]
    Create,
    /// `ALTER TABLE`
    Alter,
    /// `DROP TABLE`
    Drop,
    /// `DROP TABLE IF EXISTS`, ignoring failures.
    DropIfExists,
}

/// A named secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub kind: IndexKind,
    pub name: String,
    pub columns: Vec<String>,
}

/// Generates `{prefix}_{table}_{col1}_{col2}...`.
#[must_use]
pub fn index_name(kind: IndexKind, table: &str, columns: &[&str]) -> String {
    let mut parts = vec![kind.prefix(), table];
    parts.extend_from_slice(columns);
    parts.join("_")
}

/// Fluent table definition bound to one table and one query builder.
#[derive(Debug, Clone)]
pub struct Blueprint {
    table: String,
    query: QueryBuilder,
    registry: ColumnTypeRegistry,
    action: BlueprintAction,
    columns: Vec<ColumnBuilder>,
    indexes: Vec<IndexDefinition>,
    foreign_keys: Vec<ForeignKeyDefinition>,
    primary_key: Vec<String>,
    drop_columns: Vec<String>,
    rename_columns: Vec<(String, String)>,
    modify_columns: Vec<ColumnBuilder>,
    drop_indexes: Vec<String>,
    drop_foreign_keys: Vec<String>,
    options: TableOptions,
    with_timestamps: bool,
    with_soft_deletes: bool,
}

impl Blueprint {
    fn with_action(table: &str, query: QueryBuilder, action: BlueprintAction) -> Self {
        Self {
            table: String::from(table),
            query,
            registry: ColumnTypeRegistry::default(),
            action,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            primary_key: Vec::new(),
            drop_columns: Vec::new(),
            rename_columns: Vec::new(),
            modify_columns: Vec::new(),
            drop_indexes: Vec::new(),
            drop_foreign_keys: Vec::new(),
            options: TableOptions {
                if_not_exists: false,
                ..TableOptions::default()
            },
            with_timestamps: false,
            with_soft_deletes: false,
        }
    }

    /// Starts a CREATE TABLE definition.
    #[must_use]
    pub fn create(table: &str, query: QueryBuilder) -> Self {
        Self::with_action(table, query, BlueprintAction::Create)
    }

    /// Starts an ALTER TABLE definition.
    #[must_use]
    pub fn alter(table: &str, query: QueryBuilder) -> Self {
        Self::with_action(table, query, BlueprintAction::Alter)
    }

    /// Prepares a DROP TABLE.
    #[must_use]
    pub fn drop(table: &str, query: QueryBuilder) -> Self {
        Self::with_action(table, query, BlueprintAction::Drop)
    }

    /// Prepares a DROP TABLE IF EXISTS.
    #[must_use]
    pub fn drop_if_exists(table: &str, query: QueryBuilder) -> Self {
        Self::with_action(table, query, BlueprintAction::DropIfExists)
    }

    /// Replaces the action.
    pub fn set_action(&mut self, action: BlueprintAction) -> &mut Self {
        self.action = action;
        self
    }

    /// Replaces the column type registry used by [`add_column_of`](Self::add_column_of).
    pub fn set_registry(&mut self, registry: ColumnTypeRegistry) -> &mut Self {
        self.registry = registry;
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the action.
    #[must_use]
    pub const fn action(&self) -> BlueprintAction {
        self.action
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnBuilder] {
        &self.columns
    }

    /// Returns the staged indexes, unique keys included.
    #[must_use]
    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    /// Returns `true` once [`timestamps`](Self::timestamps) has been called.
    #[must_use]
    pub const fn has_timestamps(&self) -> bool {
        self.with_timestamps
    }

    /// Returns `true` once [`soft_deletes`](Self::soft_deletes) has been called.
    #[must_use]
    pub const fn has_soft_deletes(&self) -> bool {
        self.with_soft_deletes
    }

    // ----- columns -----

    /// Adds a pre-built column. A column with the same name is replaced in
    /// its original position.
    pub fn column(&mut self, column: ColumnBuilder) -> &mut ColumnBuilder {
        let index = match self.columns.iter().position(|c| c.name() == column.name()) {
            Some(i) => {
                self.columns[i] = column;
                i
            }
            None => {
                self.columns.push(column);
                self.columns.len() - 1
            }
        };
        &mut self.columns[index]
    }

    /// Adds a column built by the registry entry `type_name`.
    pub fn add_column_of(&mut self, type_name: &str, name: &str) -> Result<&mut ColumnBuilder> {
        let column = self.registry.build(type_name, &self.query, name)?;
        Ok(self.column(column))
    }

    /// Adds an auto-incrementing unsigned primary key.
    pub fn id(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.id(name);
        self.column(column)
    }

    /// Adds a `VARCHAR(length)` column.
    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnBuilder {
        let column = self.query.string(name, length);
        self.column(column)
    }

    /// Adds an `INTEGER` column.
    pub fn integer(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.integer(name);
        self.column(column)
    }

    /// Adds a `BIGINT` column.
    pub fn big_integer(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.big_integer(name);
        self.column(column)
    }

    /// Adds a `TINYINT` column.
    pub fn tiny_integer(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.tiny_integer(name);
        self.column(column)
    }

    /// Adds a `TEXT` column.
    pub fn text(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.text(name);
        self.column(column)
    }

    /// Adds a `BOOLEAN` column.
    pub fn boolean(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.boolean(name);
        self.column(column)
    }

    /// Adds a `FLOAT` column.
    pub fn float(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.float(name);
        self.column(column)
    }

    /// Adds a `DECIMAL(precision, scale)` column.
    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> &mut ColumnBuilder {
        let column = self.query.decimal(name, precision, scale);
        self.column(column)
    }

    /// Adds a `DATE` column.
    pub fn date(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.date(name);
        self.column(column)
    }

    /// Adds a `DATETIME` column.
    pub fn date_time(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.date_time(name);
        self.column(column)
    }

    /// Adds a `TIMESTAMP` column.
    pub fn timestamp(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.timestamp(name);
        self.column(column)
    }

    /// Adds an unsigned integer column for a foreign key.
    pub fn foreign_id(&mut self, name: &str) -> &mut ColumnBuilder {
        let column = self.query.foreign_id(name);
        self.column(column)
    }

    /// Adds an `ENUM('a', 'b', ...)` column. The type text is used as is.
    pub fn enum_(&mut self, name: &str, values: &[&str]) -> &mut ColumnBuilder {
        let sql_type = format!("ENUM({})", quoted_list(values));
        self.raw_column(name, sql_type)
    }

    /// Adds a `SET('a', 'b', ...)` column. The type text is used as is.
    pub fn set(&mut self, name: &str, values: &[&str]) -> &mut ColumnBuilder {
        let sql_type = format!("SET({})", quoted_list(values));
        self.raw_column(name, sql_type)
    }

    /// Adds a `BLOB` column.
    pub fn binary(&mut self, name: &str) -> &mut ColumnBuilder {
        self.raw_column(name, String::from("BLOB"))
    }

    /// Adds a `POINT` column.
    pub fn point(&mut self, name: &str) -> &mut ColumnBuilder {
        self.raw_column(name, String::from("POINT"))
    }

    fn raw_column(&mut self, name: &str, sql_type: String) -> &mut ColumnBuilder {
        let column = ColumnBuilder::new(name, sql_type, Arc::clone(self.query.grammar()));
        self.column(column)
    }

    // ----- constraints -----

    /// Declares a composite primary key.
    pub fn primary(&mut self, columns: &[&str]) -> &mut Self {
        self.primary_key = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    /// Adds an index with a generated name.
    pub fn index(&mut self, columns: &[&str]) -> &mut Self {
        self.add_index(IndexKind::Index, None, columns)
    }

    /// Adds an index with an explicit name.
    pub fn index_named(&mut self, name: &str, columns: &[&str]) -> &mut Self {
        self.add_index(IndexKind::Index, Some(name), columns)
    }

    /// Adds a unique key with a generated name.
    pub fn unique(&mut self, columns: &[&str]) -> &mut Self {
        self.add_index(IndexKind::Unique, None, columns)
    }

    /// Adds a unique key with an explicit name.
    pub fn unique_named(&mut self, name: &str, columns: &[&str]) -> &mut Self {
        self.add_index(IndexKind::Unique, Some(name), columns)
    }

    /// Adds a full-text index (MySQL).
    pub fn fulltext(&mut self, columns: &[&str]) -> &mut Self {
        self.add_index(IndexKind::Fulltext, None, columns)
    }

    /// Adds a spatial index (MySQL).
    pub fn spatial(&mut self, columns: &[&str]) -> &mut Self {
        self.add_index(IndexKind::Spatial, None, columns)
    }

    fn add_index(&mut self, kind: IndexKind, name: Option<&str>, columns: &[&str]) -> &mut Self {
        let name = name.map_or_else(|| index_name(kind, &self.table, columns), String::from);
        let definition = IndexDefinition {
            kind,
            name,
            columns: columns.iter().map(|c| String::from(*c)).collect(),
        };
        match self.indexes.iter_mut().find(|i| i.name == definition.name) {
            Some(existing) => *existing = definition,
            None => self.indexes.push(definition),
        }
        self
    }

    /// Adds a foreign key on `column`. Configure it through the returned
    /// definition. Keys that resolve to the same constraint name collapse to
    /// the last one declared.
    pub fn foreign(&mut self, column: &str) -> &mut ForeignKeyDefinition {
        self.foreign_keys.push(ForeignKeyDefinition::new(column));
        let last = self.foreign_keys.len() - 1;
        &mut self.foreign_keys[last]
    }

    // ----- alterations -----

    /// Drops a column (ALTER only).
    pub fn drop_column(&mut self, name: &str) -> &mut Self {
        self.drop_columns.push(String::from(name));
        self
    }

    /// Stages a column rename.
    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.rename_columns
            .push((String::from(from), String::from(to)));
        self
    }

    /// Stages a column modification.
    pub fn modify_column(&mut self, column: ColumnBuilder) -> &mut ColumnBuilder {
        self.modify_columns.push(column);
        let last = self.modify_columns.len() - 1;
        &mut self.modify_columns[last]
    }

    /// Stages an index drop.
    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.drop_indexes.push(String::from(name));
        self
    }

    /// Stages a foreign key drop.
    pub fn drop_foreign(&mut self, name: &str) -> &mut Self {
        self.drop_foreign_keys.push(String::from(name));
        self
    }

    // ----- table options -----

    /// Sets the storage engine.
    pub fn engine(&mut self, engine: &str) -> &mut Self {
        self.options.engine = Some(String::from(engine));
        self
    }

    /// Sets the default character set.
    pub fn charset(&mut self, charset: &str) -> &mut Self {
        self.options.charset = Some(String::from(charset));
        self
    }

    /// Sets the default collation.
    pub fn collation(&mut self, collation: &str) -> &mut Self {
        self.options.collation = Some(String::from(collation));
        self
    }

    /// Sets the first auto-increment value.
    pub fn auto_increment_from(&mut self, start: u64) -> &mut Self {
        self.options.auto_increment = Some(start);
        self
    }

    /// Sets the table comment.
    pub fn comment(&mut self, comment: &str) -> &mut Self {
        self.options.comment = Some(String::from(comment));
        self
    }

    /// Adds `IF NOT EXISTS` to the CREATE statement.
    pub fn if_not_exists(&mut self) -> &mut Self {
        self.options.if_not_exists = true;
        self
    }

    /// Creates a temporary table.
    pub fn temporary(&mut self) -> &mut Self {
        self.options.temporary = true;
        self
    }

    // ----- compilation -----

    /// Compiles the definition into the statements [`build`](Self::build)
    /// runs, in order.
    pub fn statements(&self) -> Result<Vec<String>> {
        let (main, follow_ups) = self.compile()?;
        let mut statements = Vec::with_capacity(follow_ups.len() + 1);
        if let Some(query) = main {
            statements.push(query.to_sql()?);
        }
        statements.extend(follow_ups);
        Ok(statements)
    }

    /// Compiles and executes the definition.
    ///
    /// For [`BlueprintAction::DropIfExists`] an execution failure is logged
    /// and ignored.
    pub async fn build(self) -> Result<()> {
        let (main, follow_ups) = self.compile()?;
        if let Some(query) = main {
            let result = query.execute().await;
            match (result, self.action) {
                (Ok(_), _) => {}
                (Err(err), BlueprintAction::DropIfExists) => {
                    warn!(table = %self.table, error = %err, "Ignoring failed drop");
                }
                (Err(err), _) => return Err(err),
            }
        }
        for sql in follow_ups {
            self.query.fresh().execute_sql(&sql).await?;
        }
        Ok(())
    }

    /// Returns the main builder, if any, and raw follow-up statements.
    fn compile(&self) -> Result<(Option<QueryBuilder>, Vec<String>)> {
        match self.action {
            BlueprintAction::Create => self.compile_create(),
            BlueprintAction::Alter => self.compile_alter(),
            BlueprintAction::Drop => Ok((Some(self.query.fresh().drop_table(&self.table)), Vec::new())),
            BlueprintAction::DropIfExists => Ok((
                Some(self.query.fresh().drop_table_if_exists(&self.table)),
                Vec::new(),
            )),
        }
    }

    fn compile_create(&self) -> Result<(Option<QueryBuilder>, Vec<String>)> {
        let grammar = Arc::clone(self.query.grammar());
        let mut defs: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        let mut follow_ups = Vec::new();

        if !self.primary_key.is_empty() {
            defs.push(format!("PRIMARY KEY ({})", self.wrap_columns(&self.primary_key)));
        }
        for index in &self.indexes {
            if index.kind == IndexKind::Unique {
                defs.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    index.name,
                    self.wrap_columns(&index.columns)
                ));
            } else if let Some(inline) =
                grammar.compile_inline_index(index.kind, &index.name, &index.columns)
            {
                defs.push(inline);
            } else {
                follow_ups.push(grammar.compile_create_index(
                    index.kind,
                    &index.name,
                    &self.table,
                    &index.columns,
                )?);
            }
        }
        // Constraint names are unique per table; a redeclared key replaces the
        // earlier one in place.
        let mut constraints: Vec<(String, String)> = Vec::with_capacity(self.foreign_keys.len());
        for foreign in &self.foreign_keys {
            let name = foreign.constraint_name(&self.table)?;
            let sql = foreign.to_sql(&self.table, grammar.as_ref())?;
            match constraints.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = sql,
                None => constraints.push((name, sql)),
            }
        }
        defs.extend(constraints.into_iter().map(|(_, sql)| sql));

        let query = self
            .query
            .fresh()
            .create_table(&self.table, defs, self.options.clone());
        Ok((Some(query), follow_ups))
    }

    fn compile_alter(&self) -> Result<(Option<QueryBuilder>, Vec<String>)> {
        self.ensure_alter_supported()?;
        let grammar = Arc::clone(self.query.grammar());

        let follow_ups = self
            .indexes
            .iter()
            .map(|index| {
                grammar.compile_create_index(index.kind, &index.name, &self.table, &index.columns)
            })
            .collect::<Result<Vec<_>>>()?;

        if self.columns.is_empty() && self.drop_columns.is_empty() {
            if follow_ups.is_empty() {
                return Err(DbError::Compilation(format!(
                    "ALTER TABLE {} has no changes",
                    self.table
                )));
            }
            return Ok((None, follow_ups));
        }

        let mut query = self.query.fresh().alter_table(&self.table);
        for column in &self.columns {
            query = query.add_column(column);
        }
        for column in &self.drop_columns {
            query = query.drop_column(column);
        }
        Ok((Some(query), follow_ups))
    }

    /// Rejects staged changes the ALTER path does not emit.
    fn ensure_alter_supported(&self) -> Result<()> {
        let mut staged = Vec::new();
        if !self.modify_columns.is_empty() {
            let names: Vec<&str> = self.modify_columns.iter().map(ColumnBuilder::name).collect();
            staged.push(format!("modify columns [{}]", names.join(", ")));
        }
        if !self.rename_columns.is_empty() {
            let pairs: Vec<String> = self
                .rename_columns
                .iter()
                .map(|(from, to)| format!("{from} -> {to}"))
                .collect();
            staged.push(format!("rename columns [{}]", pairs.join(", ")));
        }
        if !self.drop_indexes.is_empty() {
            staged.push(format!("drop indexes [{}]", self.drop_indexes.join(", ")));
        }
        if !self.drop_foreign_keys.is_empty() {
            staged.push(format!(
                "drop foreign keys [{}]",
                self.drop_foreign_keys.join(", ")
            ));
        }
        if !self.foreign_keys.is_empty() {
            let columns: Vec<&str> = self
                .foreign_keys
                .iter()
                .map(ForeignKeyDefinition::column)
                .collect();
            staged.push(format!("add foreign keys on [{}]", columns.join(", ")));
        }
        if !self.primary_key.is_empty() {
            staged.push(String::from("add primary key"));
        }

        if staged.is_empty() {
            Ok(())
        } else {
            Err(DbError::Unsupported(format!(
                "ALTER TABLE {}: {}",
                self.table,
                staged.join("; ")
            )))
        }
    }

    fn wrap_columns(&self, columns: &[String]) -> String {
        let grammar = self.query.grammar();
        columns
            .iter()
            .map(|c| grammar.wrap_column(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn quoted_list(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}
