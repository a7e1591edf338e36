//! Applying and rolling back migrations in batches.
//!
//! Each [`MigrationHandler::migrate`] call applies every pending migration
//! under one new batch number; [`MigrationHandler::rollback`] reverts the
//! highest batch. There is no transaction around a batch: if a migration
//! fails, the ones before it in the same call stay recorded.
//!
//! There is no cross-process lock either. Two handlers planning against the
//! same ledger at the same time will both run the same `up()`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use machinjiri_sql_core::Database;
use tracing::{info, warn};

use crate::error::{MigrateError, Result};
use crate::ledger::{Ledger, DEFAULT_TABLE};
use crate::migration::{Migration, MigrationRegistry};

/// Pending migrations and the batch they will be recorded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Batch number for this run.
    pub batch: i64,
    /// Keys to apply, in order.
    pub pending: Vec<String>,
}

impl MigrationPlan {
    /// Returns `true` when there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// State of one migration as reported by [`MigrationHandler::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration key.
    pub name: String,
    /// Batch it was applied in, if applied.
    pub batch: Option<i64>,
    /// When it was applied, if known.
    pub applied_at: Option<DateTime<Utc>>,
    /// Whether the key is present in the registry.
    pub registered: bool,
}

impl MigrationStatus {
    /// Returns `true` if the migration has a ledger row.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.batch.is_some()
    }
}

/// Runs registered migrations against a database and keeps the ledger.
pub struct MigrationHandler {
    db: Database,
    registry: Arc<MigrationRegistry>,
    ledger: Ledger,
}

impl MigrationHandler {
    /// Creates a handler using the default `migrations` ledger table.
    pub async fn new(db: Database, registry: Arc<MigrationRegistry>) -> Result<Self> {
        Self::with_table(db, registry, DEFAULT_TABLE).await
    }

    /// Creates a handler with a custom ledger table.
    pub async fn with_table(
        db: Database,
        registry: Arc<MigrationRegistry>,
        table: &str,
    ) -> Result<Self> {
        let ledger = Ledger::open(db.clone(), table).await?;
        Ok(Self {
            db,
            registry,
            ledger,
        })
    }

    /// Returns the ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Computes the pending migrations and the next batch number.
    pub async fn plan(&self) -> Result<MigrationPlan> {
        let applied = self.ledger.applied().await?;
        let pending = self
            .registry
            .names()
            .filter(|name| !applied.iter().any(|a| a == name))
            .map(String::from)
            .collect();
        Ok(MigrationPlan {
            batch: self.ledger.next_batch().await?,
            pending,
        })
    }

    /// Applies `plan` in order, recording each migration after its `up()`.
    ///
    /// Returns the keys that were applied.
    pub async fn apply(&self, plan: &MigrationPlan) -> Result<Vec<String>> {
        let mut applied = Vec::with_capacity(plan.pending.len());
        for name in &plan.pending {
            let migration = self.resolve(name)?;
            info!(migration = %name, batch = plan.batch, "Applying migration");
            migration.up(&self.db).await?;
            self.ledger.record(name, plan.batch).await?;
            info!(migration = %name, "Migration applied");
            applied.push(name.clone());
        }
        Ok(applied)
    }

    /// Applies every pending migration as one batch.
    pub async fn migrate(&self) -> Result<Vec<String>> {
        let plan = self.plan().await?;
        if plan.is_empty() {
            info!("Nothing to migrate");
            return Ok(Vec::new());
        }
        self.apply(&plan).await
    }

    /// Reverts the highest batch, latest migration first.
    ///
    /// Every key in the batch must be registered; otherwise nothing is run.
    /// Returns the keys that were rolled back.
    pub async fn rollback(&self) -> Result<Vec<String>> {
        let batch = self.ledger.last_batch().await?;
        if batch == 0 {
            info!("Nothing to roll back");
            return Ok(Vec::new());
        }

        let names = self.ledger.migrations_in_batch(batch).await?;
        let migrations = names
            .iter()
            .map(|name| self.resolve(name).map(|m| (name, m)))
            .collect::<Result<Vec<_>>>()?;

        let mut rolled_back = Vec::with_capacity(migrations.len());
        for (name, migration) in migrations {
            info!(migration = %name, batch, "Rolling back migration");
            migration.down(&self.db).await?;
            self.ledger.remove(name).await?;
            info!(migration = %name, "Migration rolled back");
            rolled_back.push(name.clone());
        }
        Ok(rolled_back)
    }

    /// Rolls back every batch, newest first.
    pub async fn reset(&self) -> Result<Vec<String>> {
        let mut rolled_back = Vec::new();
        loop {
            let batch = self.rollback().await?;
            if batch.is_empty() {
                break;
            }
            rolled_back.extend(batch);
        }
        Ok(rolled_back)
    }

    /// Reports every registered migration, plus ledger rows with no
    /// registered migration.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        let mut entries: HashMap<String, _> = self
            .ledger
            .entries()
            .await?
            .into_iter()
            .map(|entry| (entry.migration.clone(), entry))
            .collect();

        let mut statuses: Vec<MigrationStatus> = self
            .registry
            .names()
            .map(|name| {
                let entry = entries.remove(name);
                MigrationStatus {
                    name: String::from(name),
                    batch: entry.as_ref().map(|e| e.batch),
                    applied_at: entry.and_then(|e| e.created_at),
                    registered: true,
                }
            })
            .collect();

        let mut orphans: Vec<_> = entries.into_values().collect();
        orphans.sort_by(|a, b| a.migration.cmp(&b.migration));
        for entry in orphans {
            warn!(migration = %entry.migration, "Applied migration is not registered");
            statuses.push(MigrationStatus {
                name: entry.migration,
                batch: Some(entry.batch),
                applied_at: entry.created_at,
                registered: false,
            });
        }
        Ok(statuses)
    }

    fn resolve(&self, name: &str) -> Result<Arc<dyn Migration>> {
        self.registry
            .get(name)
            .ok_or_else(|| MigrateError::MigrationNotFound(String::from(name)))
    }
}

impl std::fmt::Debug for MigrationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationHandler")
            .field("ledger", &self.ledger)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
