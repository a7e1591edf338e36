//! Error types for the migration system.

use std::path::PathBuf;

use machinjiri_sql_core::DbError;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A ledger row or requested name has no registered migration.
    #[error("Migration not found: {0}")]
    MigrationNotFound(String),

    /// A migration name does not follow `YYYY_MM_DD_HHMMSS_name`.
    #[error("Invalid migration name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The same migration name was registered twice.
    #[error("Migration '{0}' is already registered")]
    DuplicateMigration(String),

    /// A migration file declaring the same struct already exists.
    #[error("A migration named {class} already exists: {}", path.display())]
    MigrationExists {
        /// Struct name of the migration.
        class: String,
        /// Existing file.
        path: PathBuf,
    },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Query or schema error raised while running a migration or the ledger.
    #[error(transparent)]
    Database(#[from] DbError),

    /// IO error (reading/writing migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrateError {
    /// Stable numeric code. Database errors keep the code of the wrapped
    /// error.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::MigrationNotFound(_) => 2001,
            Self::InvalidName { .. } => 2002,
            Self::DuplicateMigration(_) => 2003,
            Self::MigrationExists { .. } => 2004,
            Self::Config(_) => 2005,
            Self::Io(_) => 2006,
            Self::Serialization(_) => 2007,
            Self::Database(err) => err.code(),
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            MigrateError::MigrationNotFound("2024_01_01_000000_x".into()).code(),
            2001
        );
        let wrapped: MigrateError = DbError::execution("SELECT 1", "locked").into();
        assert_eq!(wrapped.code(), 1003);
        assert_eq!(wrapped.to_string(), "database error: locked (sql: SELECT 1)");
    }
}
