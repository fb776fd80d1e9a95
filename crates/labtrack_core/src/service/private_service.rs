//! Private workspace API.
//!
//! # Invariants
//! - Nothing here reaches the sync layer; the private document only ever
//!   lives in local storage and in explicit export files.
//! - Import replaces all three private collections and leaves the shared
//!   store alone.

use super::draft::{PrivateGoalDraft, WorkLogDraft};
use super::error::ServiceResult;
use super::transfer::{
    export_document, parse_import, ExportFile, ImportOutcome, PRIVATE_EXPORT_PREFIX,
};
use crate::id::new_id;
use crate::model::private::{PrivateData, PrivateGoal, Todo, WorkLogEntry};
use crate::repo::document_repo::DocumentRepository;
use crate::store::PrivateStore;
use chrono::{NaiveDate, Utc};
use log::info;

pub struct PrivateService<R: DocumentRepository> {
    store: PrivateStore<R>,
}

impl<R: DocumentRepository> PrivateService<R> {
    pub fn new(store: PrivateStore<R>) -> Self {
        Self { store }
    }

    pub fn data(&self) -> &PrivateData {
        self.store.data()
    }

    pub fn goals(&self) -> &[PrivateGoal] {
        self.store.list::<PrivateGoal>()
    }

    pub fn add_goal(&mut self, draft: PrivateGoalDraft) -> ServiceResult<PrivateGoal> {
        Ok(self.store.create(draft.into_record(new_id(), Utc::now()))?)
    }

    pub fn set_goal_completed(&mut self, id: &str, completed: bool) -> ServiceResult<PrivateGoal> {
        let now = Utc::now();
        Ok(self
            .store
            .update(id, |goal: &mut PrivateGoal| goal.set_completed(completed, now))?)
    }

    pub fn delete_goal(&mut self, id: &str) -> ServiceResult<PrivateGoal> {
        Ok(self.store.delete::<PrivateGoal>(id)?)
    }

    /// Work log entries, newest date first.
    pub fn work_log(&self) -> Vec<WorkLogEntry> {
        let mut entries = self.store.list::<WorkLogEntry>().to_vec();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    pub fn add_work_log(&mut self, draft: WorkLogDraft) -> ServiceResult<WorkLogEntry> {
        Ok(self.store.create(draft.into_record(new_id(), Utc::now()))?)
    }

    pub fn delete_work_log(&mut self, id: &str) -> ServiceResult<WorkLogEntry> {
        Ok(self.store.delete::<WorkLogEntry>(id)?)
    }

    pub fn todos(&self) -> &[Todo] {
        self.store.list::<Todo>()
    }

    pub fn add_todo(&mut self, title: &str) -> ServiceResult<Todo> {
        let todo = Todo {
            id: new_id(),
            title: title.trim().to_string(),
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        Ok(self.store.create(todo)?)
    }

    pub fn toggle_todo(&mut self, id: &str) -> ServiceResult<Todo> {
        let now = Utc::now();
        Ok(self.store.update(id, |todo: &mut Todo| todo.toggle(now))?)
    }

    pub fn delete_todo(&mut self, id: &str) -> ServiceResult<Todo> {
        Ok(self.store.delete::<Todo>(id)?)
    }

    pub fn export(&self, today: NaiveDate) -> ServiceResult<ExportFile> {
        export_document(self.store.data(), PRIVATE_EXPORT_PREFIX, today)
    }

    /// Replaces the private collections after `confirm` accepts the parsed
    /// payload.
    pub fn import<F>(&mut self, payload: &str, confirm: F) -> ServiceResult<ImportOutcome>
    where
        F: FnOnce(&PrivateData) -> bool,
    {
        let data = parse_import::<PrivateData>(payload)?;
        if !confirm(&data) {
            return Ok(ImportOutcome::Declined);
        }
        self.store.replace_all(data)?;
        info!("event=private_import module=service status=ok");
        Ok(ImportOutcome::Applied)
    }
}
