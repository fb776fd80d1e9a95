//! Mutation and query API over the shared lab store.
//!
//! # Responsibility
//! - CRUD entry points for members, goals, activities and publications.
//! - Route every mutation through save, then a best-effort push.
//!
//! # Invariants
//! - A mutation is durable before its method returns, whatever the push does.
//! - The store lock is never held across the push.
//! - Deleting a member leaves goals and activities that reference it intact.

use super::draft::{ActivityDraft, GoalDraft, MemberDraft, PublicationDraft};
use super::edit_session::{EditSession, EntityKind};
use super::error::ServiceResult;
use super::query::{
    dashboard, filter_activities, filter_goals, filter_publications, ActivityFilter, Dashboard,
    GoalFilter,
};
use super::transfer::{export_document, parse_import, ExportFile, ImportOutcome, LAB_EXPORT_PREFIX};
use crate::id::new_id;
use crate::model::activity::Activity;
use crate::model::goal::Goal;
use crate::model::lab::LabData;
use crate::model::member::Member;
use crate::model::publication::{Publication, PublicationStatus};
use crate::repo::document_repo::DocumentRepository;
use crate::store::{lock_store, LabStore, SharedStore, StoreResult};
use crate::sync::{SyncError, SyncHook};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

pub struct LabService<R: DocumentRepository> {
    store: SharedStore<LabData, R>,
    sync: Option<Arc<dyn SyncHook>>,
}

impl<R: DocumentRepository> LabService<R> {
    pub fn new(store: SharedStore<LabData, R>) -> Self {
        Self { store, sync: None }
    }

    /// Pushes after every mutation while `sync` reports connected.
    pub fn with_sync(mut self, sync: Arc<dyn SyncHook>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Cloned snapshot of all shared collections.
    pub fn snapshot(&self) -> ServiceResult<LabData> {
        Ok(lock_store(&self.store)?.data().clone())
    }

    pub fn members(&self) -> ServiceResult<Vec<Member>> {
        Ok(lock_store(&self.store)?.data().students.clone())
    }

    /// Name for a member id, `"Unknown"` when the member is gone.
    pub fn member_name(&self, id: &str) -> ServiceResult<String> {
        Ok(lock_store(&self.store)?.data().member_name(id).to_string())
    }

    pub fn goals(&self, filter: &GoalFilter) -> ServiceResult<Vec<Goal>> {
        Ok(filter_goals(lock_store(&self.store)?.data(), filter))
    }

    pub fn activities(&self, filter: &ActivityFilter) -> ServiceResult<Vec<Activity>> {
        Ok(filter_activities(lock_store(&self.store)?.data(), filter))
    }

    pub fn publications(
        &self,
        status: Option<PublicationStatus>,
    ) -> ServiceResult<Vec<Publication>> {
        Ok(filter_publications(lock_store(&self.store)?.data(), status))
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> ServiceResult<Dashboard> {
        Ok(dashboard(lock_store(&self.store)?.data(), now))
    }

    pub async fn save_member(
        &self,
        session: &EditSession,
        draft: MemberDraft,
    ) -> ServiceResult<Member> {
        let member = self.mutate(|store| match session.target(EntityKind::Member) {
            Some(id) => store.update(id, |member: &mut Member| draft.apply_to(member)),
            None => store.create(draft.into_record(new_id(), Utc::now())),
        })?;
        self.save_and_sync().await;
        Ok(member)
    }

    /// Removes the member only; references to it start resolving to "Unknown".
    pub async fn delete_member(&self, id: &str) -> ServiceResult<Member> {
        let member = self.mutate(|store| store.delete::<Member>(id))?;
        self.save_and_sync().await;
        Ok(member)
    }

    pub async fn save_goal(&self, session: &EditSession, draft: GoalDraft) -> ServiceResult<Goal> {
        let goal = self.mutate(|store| match session.target(EntityKind::Goal) {
            Some(id) => store.update(id, |goal: &mut Goal| draft.apply_to(goal)),
            None => store.create(draft.into_record(new_id(), Utc::now())),
        })?;
        self.save_and_sync().await;
        Ok(goal)
    }

    /// Marks a goal complete and stamps `completedAt`.
    pub async fn complete_goal(&self, id: &str) -> ServiceResult<Goal> {
        let now = Utc::now();
        let goal = self.mutate(|store| store.update(id, |goal: &mut Goal| goal.complete(now)))?;
        self.save_and_sync().await;
        Ok(goal)
    }

    /// Returns a goal to active; `completedAt` is cleared.
    pub async fn reopen_goal(&self, id: &str) -> ServiceResult<Goal> {
        let goal = self.mutate(|store| store.update(id, |goal: &mut Goal| goal.reopen()))?;
        self.save_and_sync().await;
        Ok(goal)
    }

    pub async fn delete_goal(&self, id: &str) -> ServiceResult<Goal> {
        let goal = self.mutate(|store| store.delete::<Goal>(id))?;
        self.save_and_sync().await;
        Ok(goal)
    }

    pub async fn save_activity(
        &self,
        session: &EditSession,
        draft: ActivityDraft,
    ) -> ServiceResult<Activity> {
        let activity = self.mutate(|store| match session.target(EntityKind::Activity) {
            Some(id) => store.update(id, |activity: &mut Activity| draft.apply_to(activity)),
            None => store.create(draft.into_record(new_id(), Utc::now())),
        })?;
        self.save_and_sync().await;
        Ok(activity)
    }

    pub async fn delete_activity(&self, id: &str) -> ServiceResult<Activity> {
        let activity = self.mutate(|store| store.delete::<Activity>(id))?;
        self.save_and_sync().await;
        Ok(activity)
    }

    pub async fn save_publication(
        &self,
        session: &EditSession,
        draft: PublicationDraft,
    ) -> ServiceResult<Publication> {
        let publication = self.mutate(|store| match session.target(EntityKind::Publication) {
            Some(id) => store.update(id, |publication: &mut Publication| {
                draft.apply_to(publication)
            }),
            None => store.create(draft.into_record(new_id(), Utc::now())),
        })?;
        self.save_and_sync().await;
        Ok(publication)
    }

    pub async fn delete_publication(&self, id: &str) -> ServiceResult<Publication> {
        let publication = self.mutate(|store| store.delete::<Publication>(id))?;
        self.save_and_sync().await;
        Ok(publication)
    }

    pub fn export(&self, today: NaiveDate) -> ServiceResult<ExportFile> {
        export_document(lock_store(&self.store)?.data(), LAB_EXPORT_PREFIX, today)
    }

    /// Replaces all shared collections with an exported document.
    ///
    /// The payload is parsed before `confirm` is asked; a parse failure
    /// leaves the store untouched.
    pub async fn import<F>(&self, payload: &str, confirm: F) -> ServiceResult<ImportOutcome>
    where
        F: FnOnce(&LabData) -> bool,
    {
        let data = parse_import::<LabData>(payload)?;
        if !confirm(&data) {
            return Ok(ImportOutcome::Declined);
        }
        self.mutate(|store| store.replace_all(data))?;
        info!("event=lab_import module=service status=ok");
        self.save_and_sync().await;
        Ok(ImportOutcome::Applied)
    }

    fn mutate<V>(&self, op: impl FnOnce(&mut LabStore<R>) -> StoreResult<V>) -> ServiceResult<V> {
        let mut store = lock_store(&self.store)?;
        Ok(op(&mut *store)?)
    }

    /// Local save already happened in `mutate`; this only pushes outward.
    async fn save_and_sync(&self) {
        let Some(sync) = self.sync.as_ref() else {
            return;
        };
        if !sync.is_connected() {
            return;
        }
        match sync.push_snapshot().await {
            Ok(()) => {}
            Err(SyncError::Busy) => {
                debug!("event=save_and_sync module=service status=skipped reason=busy");
            }
            Err(err) => {
                warn!(
                    "event=save_and_sync module=service status=error error_code={}",
                    err.code()
                );
            }
        }
    }
}
