//! Bulk export and import of whole container documents.

use super::error::{ServiceError, ServiceResult};
use crate::model::Container;
use crate::store::{parse_document, StoreError};
use chrono::NaiveDate;

pub const LAB_EXPORT_PREFIX: &str = "research-lab-backup";
pub const PRIVATE_EXPORT_PREFIX: &str = "research-lab-private-backup";

/// A ready-to-write backup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Applied,
    /// Payload was valid but the user declined the replacement.
    Declined,
}

/// `<prefix>-YYYY-MM-DD.json`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}.json", date.format("%Y-%m-%d"))
}

pub(crate) fn export_document<C: Container>(
    data: &C,
    prefix: &str,
    date: NaiveDate,
) -> ServiceResult<ExportFile> {
    let contents = serde_json::to_string_pretty(data).map_err(StoreError::Encode)?;
    Ok(ExportFile {
        file_name: export_file_name(prefix, date),
        contents,
    })
}

/// Parses an import payload before anything is replaced.
pub(crate) fn parse_import<C: Container>(payload: &str) -> ServiceResult<C> {
    parse_document::<C>(payload).map_err(|err| match err {
        StoreError::InvalidDocument(message) => ServiceError::InvalidImport(message),
        other => ServiceError::Store(other),
    })
}
