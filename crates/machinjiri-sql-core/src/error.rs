//! Error types for the query and schema layer.

use thiserror::Error;

/// Broad category of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid connection/driver configuration.
    Configuration,
    /// A statement could not be compiled from the builder state.
    Compilation,
    /// The database rejected the statement.
    Execution,
    /// The requested schema change is declared but not emitted.
    Unsupported,
}

impl ErrorKind {
    /// Stable numeric code for this kind.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Configuration => 1001,
            Self::Compilation => 1002,
            Self::Execution => 1003,
            Self::Unsupported => 1004,
        }
    }
}

/// Errors raised by grammars, builders, blueprints and connections.
#[derive(Debug, Error)]
pub enum DbError {
    /// A required connection parameter is missing or the driver is unknown.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The builder state cannot be compiled into SQL.
    #[error("compilation error: {0}")]
    Compilation(String),

    /// The referenced table of a foreign key could not be inferred.
    #[error("cannot infer referenced table from column '{column}': expected a '_id' suffix")]
    ForeignTableInference {
        /// Column the inference was attempted on.
        column: String,
    },

    /// A column type name has no registered constructor.
    #[error("unknown column type: {0}")]
    UnknownColumnType(String),

    /// The underlying database rejected the statement.
    #[error("database error: {message} (sql: {sql})")]
    Execution {
        /// Statement that failed.
        sql: String,
        /// Driver error message.
        message: String,
    },

    /// Transaction state does not allow the requested operation.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Schema change staged on a blueprint that is never emitted.
    #[error("unsupported schema change: {0}")]
    Unsupported(String),
}

impl DbError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Compilation(_)
            | Self::ForeignTableInference { .. }
            | Self::UnknownColumnType(_) => ErrorKind::Compilation,
            Self::Execution { .. } | Self::Transaction(_) => ErrorKind::Execution,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Stable numeric code, shared by every error of the same kind.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.kind().code()
    }

    /// Builds an execution error for `sql` from any displayable driver error.
    pub fn execution(sql: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Execution {
            sql: sql.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for the query and schema layer.
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable_per_kind() {
        assert_eq!(DbError::Configuration("x".into()).code(), 1001);
        assert_eq!(DbError::Compilation("x".into()).code(), 1002);
        assert_eq!(
            DbError::ForeignTableInference {
                column: "owner".into()
            }
            .code(),
            1002
        );
        assert_eq!(DbError::execution("SELECT 1", "boom").code(), 1003);
        assert_eq!(DbError::Unsupported("x".into()).code(), 1004);
    }

    #[test]
    fn test_execution_message_includes_sql() {
        let err = DbError::execution("DELETE FROM users", "no such table: users");
        assert_eq!(
            err.to_string(),
            "database error: no such table: users (sql: DELETE FROM users)"
        );
    }
}
