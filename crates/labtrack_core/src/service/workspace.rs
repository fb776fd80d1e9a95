//! Wiring of storage, stores, services and the sync engine.

use super::error::ServiceResult;
use super::lab_service::LabService;
use super::private_service::PrivateService;
use crate::db::{open_db, open_db_in_memory};
use crate::repo::document_repo::SqliteDocumentRepository;
use crate::store::{share, LabStore, PrivateStore};
use crate::sync::{GistClient, RemoteDocument, SyncEngine, SyncHook, SyncSettings};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Everything a front end needs, opened against one database file.
pub struct Workspace<T: RemoteDocument + 'static = GistClient> {
    pub lab: LabService<SqliteDocumentRepository>,
    pub private: PrivateService<SqliteDocumentRepository>,
    pub sync: Arc<SyncEngine<SqliteDocumentRepository, T>>,
}

impl Workspace<GistClient> {
    /// Opens (or creates) the workspace database at `path`.
    pub fn open(path: impl AsRef<Path>, settings: SyncSettings) -> ServiceResult<Self> {
        let remote = GistClient::new(&settings)?;
        Self::assemble(open_db(path)?, remote, settings)
    }

    pub fn open_in_memory(settings: SyncSettings) -> ServiceResult<Self> {
        let remote = GistClient::new(&settings)?;
        Self::assemble(open_db_in_memory()?, remote, settings)
    }
}

impl<T: RemoteDocument + 'static> Workspace<T> {
    /// Builds a workspace over an already-migrated connection and any remote.
    pub fn assemble(conn: Connection, remote: T, settings: SyncSettings) -> ServiceResult<Self> {
        let repo = SqliteDocumentRepository::new(conn);
        let lab_store = share(LabStore::load(repo.clone())?);
        let private_store = PrivateStore::load(repo.clone())?;

        let sync = SyncEngine::restore(lab_store.clone(), repo, remote, settings)?;
        let hook: Arc<dyn SyncHook> = sync.clone();
        Ok(Self {
            lab: LabService::new(lab_store).with_sync(hook),
            private: PrivateService::new(private_store),
            sync,
        })
    }
}
