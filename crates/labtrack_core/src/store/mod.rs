//! In-memory stores mirrored to durable documents.
//!
//! # Responsibility
//! - Own one container document (`LabData` or `PrivateData`) in memory.
//! - Persist the whole container after every mutation.
//!
//! # Invariants
//! - A mutation is applied to a copy, persisted, and only then made visible;
//!   a failed save leaves both memory and disk at the last good state.
//! - `save` always writes the entire container as one document.
//! - A document adopted from the remote is kept verbatim, in memory and on
//!   disk, until the next mutation re-serializes the container.
//! - Stores never talk to the network. Outbound sync is layered on top by
//!   the service for the shared store only.

mod document;

pub use document::{decode_stored, parse_document};

use crate::model::lab::LabData;
use crate::model::private::PrivateData;
use crate::model::{Collection, Container, ValidationError};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

pub type StoreResult<T> = Result<T, StoreError>;

/// The shared, syncable Local Store.
pub type LabStore<R> = Store<LabData, R>;
/// The local-only Private Store.
pub type PrivateStore<R> = Store<PrivateData, R>;
/// A store handle shared between the service and the sync engine.
pub type SharedStore<C, R> = Arc<Mutex<Store<C, R>>>;

#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Validation(ValidationError),
    NotFound {
        collection: &'static str,
        id: String,
    },
    DuplicateId {
        collection: &'static str,
        id: String,
    },
    Encode(serde_json::Error),
    /// Payload is not a JSON object of the expected shape.
    InvalidDocument(String),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} record not found: {id}"),
            Self::DuplicateId { collection, id } => {
                write!(f, "{collection} already contains id {id}")
            }
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One container document held in memory and mirrored to a repository.
pub struct Store<C: Container, R: DocumentRepository> {
    repo: R,
    data: C,
    /// Exact text of the last adopted document while `data` still matches it.
    adopted: Option<String>,
}

impl<C: Container, R: DocumentRepository> Store<C, R> {
    /// Loads the durable snapshot, seeding defaults on a cold start.
    ///
    /// Malformed stored collections are read as empty, see [`decode_stored`].
    pub fn load(repo: R) -> StoreResult<Self> {
        let mut data = match repo.read_document(C::DOCUMENT_KEY)? {
            Some(body) => decode_stored::<C>(&body),
            None => C::default(),
        };

        let mut store = Self {
            repo,
            data: C::default(),
            adopted: None,
        };
        let seeded = data.bootstrap();
        if seeded {
            store.commit(data)?;
        } else {
            store.data = data;
        }
        info!(
            "event=store_load module=store status=ok key={} seeded={seeded}",
            C::DOCUMENT_KEY
        );
        Ok(store)
    }

    pub fn data(&self) -> &C {
        &self.data
    }

    /// Persists the whole in-memory container.
    pub fn save(&self) -> StoreResult<()> {
        match &self.adopted {
            Some(body) => self.persist(body),
            None => self.write(&self.data),
        }
    }

    /// Human-readable form used for the remote document and exports.
    ///
    /// Returns the adopted document unchanged when nothing was mutated since
    /// [`Store::adopt`].
    pub fn to_pretty_json(&self) -> StoreResult<String> {
        match &self.adopted {
            Some(body) => Ok(body.clone()),
            None => serde_json::to_string_pretty(&self.data).map_err(StoreError::Encode),
        }
    }

    /// Wholesale-replaces every collection and persists.
    pub fn replace_all(&mut self, data: C) -> StoreResult<()> {
        self.commit(data)
    }

    /// Wholesale-replaces from a parsed document and keeps its exact text.
    ///
    /// `body` is persisted as-is, so fields the model does not carry
    /// (explicit nulls, millisecond timestamps) survive until the next edit.
    pub fn adopt(&mut self, data: C, body: String) -> StoreResult<()> {
        self.persist(&body)?;
        self.data = data;
        self.adopted = Some(body);
        Ok(())
    }

    pub fn list<T: Collection<C>>(&self) -> &[T] {
        T::records(&self.data)
    }

    pub fn get<T: Collection<C>>(&self, id: &str) -> Option<&T> {
        T::records(&self.data).iter().find(|record| record.id() == id)
    }

    /// Appends a new record and persists.
    pub fn create<T: Collection<C>>(&mut self, record: T) -> StoreResult<T> {
        record.validate()?;
        if self.get::<T>(record.id()).is_some() {
            return Err(StoreError::DuplicateId {
                collection: T::NAME,
                id: record.id().to_string(),
            });
        }

        let mut next = self.data.clone();
        T::records_mut(&mut next).push(record.clone());
        self.commit(next)?;
        debug!(
            "event=record_create module=store status=ok collection={}",
            T::NAME
        );
        Ok(record)
    }

    /// Edits one record in place, stamps `updatedAt`, and persists.
    pub fn update<T, F>(&mut self, id: &str, edit: F) -> StoreResult<T>
    where
        T: Collection<C>,
        F: FnOnce(&mut T),
    {
        let mut next = self.data.clone();
        let record = T::records_mut(&mut next)
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| not_found::<C, T>(id))?;
        edit(record);
        record.touch(chrono::Utc::now());
        record.validate()?;
        let updated = record.clone();

        self.commit(next)?;
        debug!(
            "event=record_update module=store status=ok collection={}",
            T::NAME
        );
        Ok(updated)
    }

    /// Removes one record and persists. Nothing else is touched.
    pub fn delete<T: Collection<C>>(&mut self, id: &str) -> StoreResult<T> {
        let mut next = self.data.clone();
        let records = T::records_mut(&mut next);
        let index = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| not_found::<C, T>(id))?;
        let removed = records.remove(index);

        self.commit(next)?;
        debug!(
            "event=record_delete module=store status=ok collection={}",
            T::NAME
        );
        Ok(removed)
    }

    fn commit(&mut self, next: C) -> StoreResult<()> {
        self.write(&next)?;
        self.data = next;
        self.adopted = None;
        Ok(())
    }

    fn write(&self, data: &C) -> StoreResult<()> {
        let body = serde_json::to_string(data).map_err(StoreError::Encode)?;
        self.persist(&body)
    }

    fn persist(&self, body: &str) -> StoreResult<()> {
        if let Err(err) = self.repo.write_document(C::DOCUMENT_KEY, body) {
            error!(
                "event=store_save module=store status=error key={} error={err}",
                C::DOCUMENT_KEY
            );
            return Err(err.into());
        }
        debug!(
            "event=store_save module=store status=ok key={} bytes={}",
            C::DOCUMENT_KEY,
            body.len()
        );
        Ok(())
    }
}

/// Locks a shared store, mapping poisoning to a store error.
pub fn lock_store<C: Container, R: DocumentRepository>(
    shared: &SharedStore<C, R>,
) -> StoreResult<MutexGuard<'_, Store<C, R>>> {
    shared.lock().map_err(|_| StoreError::LockPoisoned)
}

/// Wraps a store for sharing with the sync engine.
pub fn share<C: Container, R: DocumentRepository>(store: Store<C, R>) -> SharedStore<C, R> {
    Arc::new(Mutex::new(store))
}

fn not_found<C: Container, T: Collection<C>>(id: &str) -> StoreError {
    StoreError::NotFound {
        collection: T::NAME,
        id: id.to_string(),
    }
}
