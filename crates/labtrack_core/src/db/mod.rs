//! Durable document database.
//!
//! One SQLite file holds every persisted document: the shared lab snapshot,
//! the private snapshot and the sync configuration, each as a single JSON
//! text row in the `documents` table keyed by its storage key.
//!
//! # Invariants
//! - A connection handed out by [`open_db`] or [`open_db_in_memory`] is at
//!   the latest schema; callers never see a half-migrated file.
//! - A file written by a newer build is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of [`migrations::latest_version`].
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable `error_code` value for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "document database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "document database was written by a newer version (schema {found}, this build reads up to {supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
