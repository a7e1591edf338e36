//! The migration contract and the registry of known migrations.
//!
//! Migrations are values registered under a `YYYY_MM_DD_HHMMSS_name` key.
//! The timestamp prefix orders them; the registry iterates in key order,
//! which is the order pending migrations are applied in.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use machinjiri_sql_core::Database;
use regex::Regex;

use crate::error::{MigrateError, Result};

/// `YYYY_MM_DD_HHMMSS_snake_name`
static NAME_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(\d{4})_(\d{2})_(\d{2})_(\d{6})_([a-z][a-z0-9_]*)$"));

/// A reversible schema change.
///
/// # Example
///
/// ```rust,ignore
/// pub struct CreateUsersTable;
///
/// #[async_trait]
/// impl Migration for CreateUsersTable {
///     async fn up(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
///         let mut table = db.create("users");
///         table.id("id");
///         table.string("email", 190).not_null();
///         table.build().await
///     }
///
///     async fn down(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
///         db.drop_if_exists("users").await
///     }
/// }
/// ```
#[async_trait]
pub trait Migration: Send + Sync {
    /// Applies the change.
    async fn up(&self, db: &Database) -> machinjiri_sql_core::Result<()>;

    /// Reverts the change.
    async fn down(&self, db: &Database) -> machinjiri_sql_core::Result<()>;
}

/// Splits a migration key into its timestamp and snake-case name.
pub fn parse_name(name: &str) -> Result<(String, String)> {
    let pattern = NAME_PATTERN.as_ref().map_err(|e| MigrateError::InvalidName {
        name: String::from(name),
        reason: e.to_string(),
    })?;
    let captures = pattern
        .captures(name)
        .ok_or_else(|| MigrateError::InvalidName {
            name: String::from(name),
            reason: String::from("expected YYYY_MM_DD_HHMMSS_snake_name"),
        })?;
    let timestamp = format!(
        "{}_{}_{}_{}",
        &captures[1], &captures[2], &captures[3], &captures[4]
    );
    Ok((timestamp, String::from(&captures[5])))
}

/// PascalCase of a snake-case name: `create_users_table` -> `CreateUsersTable`.
#[must_use]
pub fn class_name(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect()
}

/// Typed map of migrations keyed by `YYYY_MM_DD_HHMMSS_name`.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<String, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `migration` under `name`.
    pub fn register<M>(&mut self, name: &str, migration: M) -> Result<&mut Self>
    where
        M: Migration + 'static,
    {
        parse_name(name)?;
        if self.migrations.contains_key(name) {
            return Err(MigrateError::DuplicateMigration(String::from(name)));
        }
        self.migrations
            .insert(String::from(name), Arc::new(migration));
        Ok(self)
    }

    /// Returns the migration registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Migration>> {
        self.migrations.get(name).cloned()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.migrations.contains_key(name)
    }

    /// Returns the registered names in application order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.migrations.keys().map(String::as_str)
    }

    /// Number of registered migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.migrations.keys()).finish()
    }
}
