//! Use-case services over the stores.
//!
//! # Responsibility
//! - Turn form drafts into store mutations ([`lab_service`], [`private_service`]).
//! - Filtering, sorting and dashboard aggregation ([`query`]).
//! - Whole-document export and import ([`transfer`]).
//! - Assemble a ready workspace ([`workspace`]).

pub mod draft;
pub mod edit_session;
pub mod error;
pub mod lab_service;
pub mod private_service;
pub mod query;
pub mod transfer;
pub mod workspace;

pub use edit_session::{EditSession, EntityKind};
pub use error::{ServiceError, ServiceResult};
pub use lab_service::LabService;
pub use private_service::PrivateService;
pub use transfer::{ExportFile, ImportOutcome};
pub use workspace::Workspace;
