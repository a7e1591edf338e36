//! Batch-based database migrations for machinjiri.
//!
//! Migrations are Rust values implementing [`Migration`], registered under a
//! timestamped key in a [`MigrationRegistry`]. A [`MigrationHandler`] applies
//! the pending ones and records them in a ledger table; every `migrate()`
//! call forms one batch, and `rollback()` reverts the latest batch.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use machinjiri_migrate::prelude::*;
//!
//! pub struct CreatePostsTable;
//!
//! #[async_trait]
//! impl Migration for CreatePostsTable {
//!     async fn up(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
//!         let mut table = db.create("posts");
//!         table.id("id");
//!         table.string("title", 200).not_null();
//!         table.foreign_id("user_id");
//!         table.foreign("user_id").on_delete("cascade");
//!         table.timestamps();
//!         table.build().await
//!     }
//!
//!     async fn down(&self, db: &Database) -> machinjiri_sql_core::Result<()> {
//!         db.drop_if_exists("posts").await
//!     }
//! }
//!
//! let mut registry = MigrationRegistry::new();
//! registry.register("2024_03_01_120000_create_posts_table", CreatePostsTable)?;
//!
//! let handler = MigrationHandler::new(db, Arc::new(registry)).await?;
//! handler.migrate().await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! machinjiri-migrate init
//! machinjiri-migrate make create_posts_table
//! machinjiri-migrate migrate
//! machinjiri-migrate status
//! machinjiri-migrate rollback
//! ```

pub mod cli;
pub mod config;
pub mod creator;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod migration;

pub use config::MigrateConfig;
pub use creator::MigrationCreator;
pub use error::{MigrateError, Result};
pub use handler::{MigrationHandler, MigrationPlan, MigrationStatus};
pub use ledger::{Ledger, LedgerEntry};
pub use migration::{class_name, parse_name, Migration, MigrationRegistry};

/// Prelude for writing and running migrations.
pub mod prelude {
    pub use async_trait::async_trait;
    pub use machinjiri_sql_core::{Blueprint, Database};

    pub use crate::error::{MigrateError, Result};
    pub use crate::handler::MigrationHandler;
    pub use crate::migration::{Migration, MigrationRegistry};
}
