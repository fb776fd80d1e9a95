//! Service-level error type.

use crate::db::DbError;
use crate::repo::document_repo::RepoError;
use crate::store::StoreError;
use crate::sync::SyncError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    /// Import payload could not be parsed; nothing was replaced.
    InvalidImport(String),
    Sync(SyncError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidImport(message) => write!(f, "import file is invalid: {message}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::InvalidImport(_) => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Store(StoreError::Repo(value))
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Store(StoreError::Repo(RepoError::Db(value)))
    }
}

impl From<SyncError> for ServiceError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}
