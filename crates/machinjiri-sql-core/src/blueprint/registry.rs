//! Named column constructors for [`Blueprint::add_column_of`].
//!
//! [`Blueprint::add_column_of`]: super::Blueprint::add_column_of

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::column::ColumnBuilder;
use crate::error::{DbError, Result};
use crate::query::QueryBuilder;

/// Builds a column named by the second argument using the builder's grammar.
pub type ColumnFactory = Arc<dyn Fn(&QueryBuilder, &str) -> ColumnBuilder + Send + Sync>;

/// Maps column type names to constructor functions.
#[derive(Clone)]
pub struct ColumnTypeRegistry {
    factories: BTreeMap<String, ColumnFactory>,
}

impl ColumnTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&QueryBuilder, &str) -> ColumnBuilder + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_lowercase(), Arc::new(factory));
        self
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Builds a column of type `type_name`.
    pub fn build(&self, type_name: &str, query: &QueryBuilder, column: &str) -> Result<ColumnBuilder> {
        self.factories
            .get(&type_name.to_lowercase())
            .map(|factory| factory(query, column))
            .ok_or_else(|| DbError::UnknownColumnType(String::from(type_name)))
    }
}

impl Default for ColumnTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("id", |q, n| q.id(n))
            .register("string", |q, n| q.string(n, 255))
            .register("integer", |q, n| q.integer(n))
            .register("big_integer", |q, n| q.big_integer(n))
            .register("tiny_integer", |q, n| q.tiny_integer(n))
            .register("text", |q, n| q.text(n))
            .register("boolean", |q, n| q.boolean(n))
            .register("float", |q, n| q.float(n))
            .register("decimal", |q, n| q.decimal(n, 8, 2))
            .register("date", |q, n| q.date(n))
            .register("date_time", |q, n| q.date_time(n))
            .register("timestamp", |q, n| q.timestamp(n))
            .register("foreign_id", |q, n| q.foreign_id(n))
            .register("binary", |q, n| {
                ColumnBuilder::new(n, "BLOB", Arc::clone(q.grammar()))
            })
            .register("point", |q, n| {
                ColumnBuilder::new(n, "POINT", Arc::clone(q.grammar()))
            });
        registry
    }
}

impl fmt::Debug for ColumnTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
