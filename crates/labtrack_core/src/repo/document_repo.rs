//! Document repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read, replace and remove whole documents by string key.
//! - Share one connection between the shared, private and sync-config stores.
//!
//! # Invariants
//! - `write_document` is an upsert of the full body; there is no partial write.
//! - Keys are non-blank.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

/// Document key of the shared, syncable lab data.
pub const LAB_DATA_KEY: &str = "researchLabData";
/// Document key of the local-only private workspace.
pub const PRIVATE_DATA_KEY: &str = "researchLabPrivateData";
/// Document key of the persisted sync configuration.
pub const SYNC_CONFIG_KEY: &str = "researchLabSyncConfig";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidKey(String),
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid document key: `{key}`"),
            Self::LockPoisoned => write!(f, "document connection lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key/value access to durable JSON documents.
pub trait DocumentRepository {
    fn read_document(&self, key: &str) -> RepoResult<Option<String>>;
    fn write_document(&self, key: &str, body: &str) -> RepoResult<()>;
}

/// SQLite-backed document repository.
///
/// Cloning is cheap and every clone shares the same connection.
#[derive(Clone)]
pub struct SqliteDocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentRepository {
    /// Wraps an already-migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl DocumentRepository for SqliteDocumentRepository {
    fn read_document(&self, key: &str) -> RepoResult<Option<String>> {
        let key = validate_key(key)?;
        let conn = self.lock()?;
        let body = conn
            .query_row(
                "SELECT body FROM documents WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(body)
    }

    fn write_document(&self, key: &str, body: &str) -> RepoResult<()> {
        let key = validate_key(key)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (key, body, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at;",
            params![key, body],
        )?;
        Ok(())
    }
}

fn validate_key(key: &str) -> RepoResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
