//! Local note store connection layer.
//!
//! # Responsibility
//! - Hand out SQLite connections with the note schema fully applied.
//! - Classify storage failures so callers can tell retryable contention
//!   from permanent damage.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version` and only moves forward.
//! - A failing migration leaves the store at its previous version.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Note store failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Store was written by a newer build.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// One schema step could not be applied; nothing from the batch was kept.
    MigrationFailed {
        version: u32,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// `true` for lock contention that may clear on retry.
    pub fn is_busy(&self) -> bool {
        let sqlite = match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => err,
            Self::UnsupportedSchemaVersion { .. } => return false,
        };
        matches!(
            sqlite.sqlite_error_code(),
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "note store error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "note store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MigrationFailed { version, source } => {
                write!(f, "note store migration {version} failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_are_retryable() {
        assert!(DbError::Sqlite(sqlite_failure(ffi::SQLITE_BUSY)).is_busy());
        assert!(DbError::MigrationFailed {
            version: 2,
            source: sqlite_failure(ffi::SQLITE_LOCKED),
        }
        .is_busy());
    }

    #[test]
    fn other_failures_are_not_retryable() {
        assert!(!DbError::Sqlite(sqlite_failure(ffi::SQLITE_CONSTRAINT)).is_busy());
        assert!(!DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows).is_busy());
        assert!(!DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        }
        .is_busy());
    }

    #[test]
    fn migration_failure_names_the_step() {
        let err = DbError::MigrationFailed {
            version: 2,
            source: sqlite_failure(ffi::SQLITE_CORRUPT),
        };
        assert!(err.to_string().starts_with("note store migration 2 failed"));
    }
}
