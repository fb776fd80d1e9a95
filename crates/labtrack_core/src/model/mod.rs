//! Domain model for the shared lab data and the private workspace.
//!
//! # Responsibility
//! - Define the records owned by each collection and their wire shape.
//! - Define the container documents (`LabData`, `PrivateData`) that are
//!   persisted and, for `LabData`, synchronized as one unit.
//!
//! # Invariants
//! - Every record carries a generated, never-reused `id`.
//! - Foreign keys (`studentId`) are advisory lookups, never ownership.
//! - Missing collections in a stored document deserialize as empty.

pub mod activity;
pub mod goal;
pub mod lab;
pub mod member;
pub mod private;
pub mod publication;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    BlankField(&'static str),
    /// `completedAt` is set while `completed` is false.
    CompletedAtWithoutCompletion(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::CompletedAtWithoutCompletion(id) => {
                write!(f, "record {id} has completedAt but is not completed")
            }
        }
    }
}

impl Error for ValidationError {}

/// One entry of a collection, addressed by its id.
pub trait Record {
    fn id(&self) -> &str;

    /// Stamps `updatedAt` after an in-place edit.
    fn touch(&mut self, at: DateTime<Utc>);

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A top-level persisted document made of several collections.
pub trait Container: Default + Clone + Serialize + DeserializeOwned + Send + 'static {
    /// Durable document key.
    const DOCUMENT_KEY: &'static str;

    /// Seeds default records on a cold start. Returns whether anything changed.
    fn bootstrap(&mut self) -> bool {
        false
    }
}

/// Binds a record type to the collection that owns it inside container `C`.
pub trait Collection<C: Container>: Record + Clone + Sized {
    /// Collection name used in log events.
    const NAME: &'static str;

    fn records(container: &C) -> &[Self];
    fn records_mut(container: &mut C) -> &mut Vec<Self>;
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Turns blank optional text into `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
