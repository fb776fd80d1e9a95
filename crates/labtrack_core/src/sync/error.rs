//! Sync error taxonomy.

use crate::logging::single_line;
use crate::repo::document_repo::RepoError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Longest remote response body kept in an error message.
const MAX_BODY_CHARS: usize = 200;

#[derive(Debug)]
pub enum SyncError {
    /// No credentials configured; the engine is `disabled`.
    Disabled,
    /// Another push or pull is in flight. Dropped, never queued.
    Busy,
    /// Token or document id is blank.
    MissingCredentials,
    /// Remote answered with a non-success status.
    Http { status: u16, body: String },
    /// Network-level failure before a status was received.
    Transport(String),
    /// Remote content is not a lab document.
    InvalidPayload(String),
    /// Local persistence failed.
    Store(StoreError),
    /// The result arrived after sync was disconnected or reconfigured.
    Superseded,
    /// First-time setup could not adopt remote data and the caller declined
    /// to initialize the remote document from local data.
    SetupDeclined(Box<SyncError>),
    LockPoisoned,
}

impl SyncError {
    pub(crate) fn http(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            body: single_line(body, MAX_BODY_CHARS),
        }
    }

    /// Stable short code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Disabled => "sync_disabled",
            Self::Busy => "sync_busy",
            Self::MissingCredentials => "missing_credentials",
            Self::Http { .. } => "http_status",
            Self::Transport(_) => "transport",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Store(_) => "store",
            Self::Superseded => "superseded",
            Self::SetupDeclined(_) => "setup_declined",
            Self::LockPoisoned => "lock_poisoned",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "sync is not configured"),
            Self::Busy => write!(f, "a sync operation is already in progress"),
            Self::MissingCredentials => write!(f, "sync token and document id are required"),
            Self::Http { status, body } => write!(f, "remote returned HTTP {status}: {body}"),
            Self::Transport(message) => write!(f, "network error: {message}"),
            Self::InvalidPayload(message) => write!(f, "remote data is invalid: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Superseded => write!(f, "sync result discarded after disconnect"),
            Self::SetupDeclined(cause) => write!(f, "sync setup cancelled: {cause}"),
            Self::LockPoisoned => write!(f, "sync state lock poisoned"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::SetupDeclined(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Store(StoreError::Repo(value))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
