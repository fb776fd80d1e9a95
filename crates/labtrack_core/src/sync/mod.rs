//! Synchronization of the shared store with a remote single-file document.
//!
//! # Responsibility
//! - Talk to the remote document host ([`remote`]).
//! - Persist credentials and sync metadata ([`config`]).
//! - Serialize push/pull attempts and poll on a timer ([`engine`]).
//!
//! # Invariants
//! - Only the shared lab document is ever transmitted; the private
//!   workspace has no path into this module.
//! - Merging is wholesale: the last side to write wins for the whole document.

pub mod config;
pub mod engine;
pub mod error;
pub mod remote;

pub use config::{SyncConfigDocument, SyncCredentials, SyncSettings, REMOTE_FILE_NAME};
pub use engine::{ConnectOutcome, PullOutcome, SyncEngine, SyncHook, SyncState, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use remote::{GistClient, RemoteDocument};
