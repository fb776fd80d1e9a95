//! Core of labtrack: research-lab records, local persistence and gist sync.
//!
//! Front ends open a [`Workspace`] and talk to its services; nothing outside
//! this crate touches storage or the network directly.

pub mod db;
pub mod id;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::activity::Activity;
pub use model::goal::{Goal, GoalType};
pub use model::lab::LabData;
pub use model::member::{Member, MemberRole};
pub use model::private::{PrivateData, PrivateGoal, Todo, WorkLogEntry};
pub use model::publication::{Publication, PublicationStatus};
pub use service::{
    EditSession, EntityKind, ExportFile, ImportOutcome, LabService, PrivateService, ServiceError,
    ServiceResult, Workspace,
};
pub use sync::{ConnectOutcome, SyncCredentials, SyncError, SyncSettings, SyncState, SyncStatus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
