//! Durable document repository.
//!
//! # Responsibility
//! - Define the key/value document contract that mirrors browser storage.
//! - Isolate SQLite details from the in-memory stores.
//!
//! # Invariants
//! - One key holds exactly one JSON document; writes replace it whole.

pub mod document_repo;
