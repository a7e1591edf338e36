//! Migration file generation.
//!
//! Writes `{YYYY_MM_DD_HHMMSS}_{name}.rs` stubs into a directory. Names of
//! the form `create_<table>_table` get a stub that creates and drops
//! `<table>`; anything else gets empty `up`/`down` bodies.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use tracing::info;

use crate::error::{MigrateError, Result};
use crate::migration::{class_name, parse_name};

/// Writes new migration files.
#[derive(Debug, Clone)]
pub struct MigrationCreator {
    directory: PathBuf,
}

impl MigrationCreator {
    /// Creates a creator writing into `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Target directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes a migration stamped with the current time.
    pub fn create(&self, name: &str) -> Result<PathBuf> {
        self.create_at(name, Utc::now().naive_utc())
    }

    /// Writes a migration stamped with `at`.
    ///
    /// Fails with [`MigrateError::MigrationExists`] if a migration with the
    /// same struct name is already in the directory.
    pub fn create_at(&self, name: &str, at: NaiveDateTime) -> Result<PathBuf> {
        let key = format!("{}_{name}", at.format("%Y_%m_%d_%H%M%S"));
        let (_, snake) = parse_name(&key)?;
        let class = class_name(&snake);

        if let Some(path) = self.find_class(&class)? {
            return Err(MigrateError::MigrationExists { class, path });
        }

        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(format!("{key}.rs"));
        fs::write(&path, render(&key, &class, &snake))?;
        info!(path = %path.display(), "Created migration");
        Ok(path)
    }

    fn find_class(&self, class: &str) -> Result<Option<PathBuf>> {
        if !self.directory.is_dir() {
            return Ok(None);
        }
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let Some(stem) = path
                .extension()
                .filter(|ext| *ext == "rs")
                .and_then(|_| path.file_stem())
                .and_then(|stem| stem.to_str())
            else {
                continue;
            };
            if let Ok((_, snake)) = parse_name(stem) {
                if class_name(&snake) == class {
                    return Ok(Some(path));
                }
            }
        }
        Ok(None)
    }
}

/// Table created by a `create_<table>_table` migration.
fn created_table(snake: &str) -> Option<&str> {
    snake
        .strip_prefix("create_")
        .and_then(|rest| rest.strip_suffix("_table"))
        .filter(|table| !table.is_empty())
}

fn render(key: &str, class: &str, snake: &str) -> String {
    let (up, down) = created_table(snake).map_or_else(
        || (String::from("        Ok(())\n"), String::from("        Ok(())\n")),
        |table| {
            (
                format!(
                    "        let mut table = db.create(\"{table}\");\n\
                     \x20       table.id(\"id\");\n\
                     \x20       table.timestamps();\n\
                     \x20       table.build().await\n"
                ),
                format!("        db.drop_if_exists(\"{table}\").await\n"),
            )
        },
    );

    format!(
        "//! Migration {key}.\n\
         \n\
         use async_trait::async_trait;\n\
         use machinjiri_migrate::Migration;\n\
         use machinjiri_sql_core::{{Database, Result}};\n\
         \n\
         pub struct {class};\n\
         \n\
         #[async_trait]\n\
         impl Migration for {class} {{\n\
         \x20   async fn up(&self, db: &Database) -> Result<()> {{\n\
         {up}\
         \x20   }}\n\
         \n\
         \x20   async fn down(&self, db: &Database) -> Result<()> {{\n\
         {down}\
         \x20   }}\n\
         }}\n"
    )
}
