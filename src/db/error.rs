//! Storage error type.

use std::fmt;

use derive_more::{Display, Error};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// A failed SQLite operation, with the repository line that raised it.
///
/// The location is where the error was converted, which for `?` is the
/// repository call site.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error: {} at {}:{}", message, file, line)]
pub struct DbError {
    /// What went wrong, prefixed with the record being touched.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates an error located at the caller.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Prefixes the message with the record being touched, e.g. `game 4`.
    pub fn context(mut self, what: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", what, self.message);
        self
    }
}

impl From<DieselError> for DbError {
    #[track_caller]
    fn from(err: DieselError) -> Self {
        let message = match &err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                format!("already exists ({})", info.message())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                format!("references a missing row ({})", info.message())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                format!("rejected by a table constraint ({})", info.message())
            }
            other => format!("query failed: {}", other),
        };
        Self::new(message)
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("cannot open database: {}", err))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for DbError {
    #[track_caller]
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::new(format!("migration failed: {}", err))
    }
}
