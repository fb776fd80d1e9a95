//! Sync engine state machine.
//!
//! # Responsibility
//! - Push the whole shared store to the remote document and pull it back.
//! - Run first-time setup, periodic pulls and disconnect.
//!
//! # Invariants
//! - At most one push or pull is in flight; a second attempt fails with
//!   [`SyncError::Busy`] and changes nothing.
//! - Every push/pull completion is checked against the generation it started
//!   in; results that arrive after a disconnect or reconnect are discarded.
//! - A failed pull never mutates the shared store.
//! - Disconnecting never deletes local data.

use super::config::{SyncConfigDocument, SyncCredentials, SyncSettings};
use super::error::{SyncError, SyncResult};
use super::remote::RemoteDocument;
use crate::model::lab::LabData;
use crate::repo::document_repo::DocumentRepository;
use crate::store::{lock_store, parse_document, SharedStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Externally visible engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disabled,
    Idle,
    Syncing,
    /// Last attempt failed. Collapses to `Idle` once the error is taken.
    Error,
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    /// Setup finished and polling is allowed.
    pub connected: bool,
    pub gist_id: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote data replaced every shared collection.
    Applied,
    /// Remote document has no tracked file yet; local data untouched.
    NoRemoteData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Existing remote data was adopted locally.
    AdoptedRemote,
    /// Remote document was empty and got initialized from local data.
    InitializedRemote,
    /// Pull failed and the caller chose to overwrite the remote document.
    ForcedPush,
}

#[derive(Debug)]
struct EngineState {
    state: SyncState,
    connected: bool,
    credentials: Option<SyncCredentials>,
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
    generation: u64,
}

impl EngineState {
    fn config_document(&self) -> SyncConfigDocument {
        let (token, gist_id) = self
            .credentials
            .as_ref()
            .map(|creds| (creds.token.clone(), creds.gist_id.clone()))
            .unwrap_or_default();
        SyncConfigDocument {
            token,
            gist_id,
            last_sync: self.last_sync,
            sync_enabled: self.connected,
            syncing: self.state == SyncState::Syncing,
        }
    }
}

/// Claim on the single in-flight slot.
struct Ticket {
    generation: u64,
    credentials: SyncCredentials,
    started_at: Instant,
}

/// Wholesale push/pull of the shared store against one remote document.
pub struct SyncEngine<R, T>
where
    R: DocumentRepository + Send + Sync + 'static,
    T: RemoteDocument + 'static,
{
    store: SharedStore<LabData, R>,
    config_repo: R,
    remote: T,
    settings: SyncSettings,
    inner: Mutex<EngineState>,
    poller: Mutex<Option<CancellationToken>>,
}

impl<R, T> SyncEngine<R, T>
where
    R: DocumentRepository + Send + Sync + 'static,
    T: RemoteDocument + 'static,
{
    /// Restores the engine from the persisted sync configuration.
    ///
    /// Polling is not started; call [`SyncEngine::start_polling`] from inside
    /// a Tokio runtime.
    pub fn restore(
        store: SharedStore<LabData, R>,
        config_repo: R,
        remote: T,
        settings: SyncSettings,
    ) -> SyncResult<Arc<Self>> {
        let config = SyncConfigDocument::load(&config_repo)?;
        let credentials = config.credentials().filter(|_| config.sync_enabled);
        let connected = credentials.is_some();
        let state = EngineState {
            state: if connected {
                SyncState::Idle
            } else {
                SyncState::Disabled
            },
            connected,
            credentials,
            last_sync: config.last_sync,
            last_error: None,
            generation: 0,
        };
        info!("event=sync_restore module=sync status=ok connected={connected}");

        Ok(Arc::new(Self {
            store,
            config_repo,
            remote,
            settings,
            inner: Mutex::new(state),
            poller: Mutex::new(None),
        }))
    }

    pub fn status(&self) -> SyncResult<SyncStatus> {
        let inner = self.lock_inner()?;
        Ok(SyncStatus {
            state: inner.state,
            connected: inner.connected,
            gist_id: inner.credentials.as_ref().map(|c| c.gist_id.clone()),
            last_sync: inner.last_sync,
            last_error: inner.last_error.clone(),
        })
    }

    /// Whether local edits should be pushed outward.
    pub fn is_connected(&self) -> bool {
        self.lock_inner().map(|inner| inner.connected).unwrap_or(false)
    }

    /// Surfaces the last failure once, collapsing `Error` back to `Idle`.
    pub fn take_error(&self) -> Option<String> {
        let mut inner = self.lock_inner().ok()?;
        if inner.state != SyncState::Error {
            return None;
        }
        inner.state = SyncState::Idle;
        inner.last_error.take()
    }

    /// Overwrites the remote document with the whole shared store.
    pub async fn push_local(&self) -> SyncResult<()> {
        let ticket = self.begin("push")?;
        let body = match lock_store(&self.store).and_then(|store| store.to_pretty_json()) {
            Ok(body) => body,
            Err(err) => return self.settle(&ticket, "push", Err(err.into())),
        };

        let result = self.remote.store(&ticket.credentials, &body).await;
        self.settle(&ticket, "push", result)
    }

    /// Replaces every shared collection with the remote document's content.
    pub async fn pull_remote(&self) -> SyncResult<PullOutcome> {
        let ticket = self.begin("pull")?;
        let fetched = self.remote.fetch(&ticket.credentials).await;

        let mut inner = self.lock_inner()?;
        if inner.generation != ticket.generation {
            debug!("event=sync_pull module=sync status=discarded reason=superseded");
            return Err(SyncError::Superseded);
        }
        let result = fetched.and_then(|content| match content {
            None => Ok(PullOutcome::NoRemoteData),
            Some(body) => {
                let data = parse_document::<LabData>(&body)
                    .map_err(|err| SyncError::InvalidPayload(err.to_string()))?;
                lock_store(&self.store)?.adopt(data, body)?;
                Ok(PullOutcome::Applied)
            }
        });
        self.finish(&mut inner, &ticket, "pull", result)
    }

    /// First-time setup: adopt remote data, or initialize the remote from
    /// local data.
    ///
    /// The pull runs first so existing remote data is never clobbered. When
    /// the remote document has no tracked file yet, local data is pushed.
    /// When the pull fails, `confirm_push` decides whether to overwrite the
    /// remote document anyway. Polling starts only after success.
    pub async fn connect<F>(
        self: &Arc<Self>,
        credentials: SyncCredentials,
        confirm_push: F,
    ) -> SyncResult<ConnectOutcome>
    where
        F: FnOnce(&SyncError) -> bool + Send,
    {
        let credentials = credentials
            .normalized()
            .ok_or(SyncError::MissingCredentials)?;
        self.stop_polling();
        {
            let mut inner = self.lock_inner()?;
            inner.generation += 1;
            inner.state = SyncState::Idle;
            inner.connected = false;
            inner.credentials = Some(credentials);
            inner.last_error = None;
        }
        info!("event=sync_connect module=sync status=start");

        let outcome = match self.pull_remote().await {
            Ok(PullOutcome::Applied) => Ok(ConnectOutcome::AdoptedRemote),
            Ok(PullOutcome::NoRemoteData) => self
                .push_local()
                .await
                .map(|()| ConnectOutcome::InitializedRemote),
            Err(err) => {
                self.take_error();
                if confirm_push(&err) {
                    self.push_local().await.map(|()| ConnectOutcome::ForcedPush)
                } else {
                    Err(SyncError::SetupDeclined(Box::new(err)))
                }
            }
        };

        match outcome {
            Ok(outcome) => {
                {
                    let mut inner = self.lock_inner()?;
                    inner.connected = true;
                    self.persist(&inner)?;
                }
                self.start_polling();
                info!("event=sync_connect module=sync status=ok outcome={outcome:?}");
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    "event=sync_connect module=sync status=error error_code={}",
                    err.code()
                );
                self.reset_to_disabled()?;
                Err(err)
            }
        }
    }

    /// Clears credentials, stops polling and returns to `Disabled`.
    pub fn disconnect(&self) -> SyncResult<()> {
        self.stop_polling();
        self.reset_to_disabled()?;
        info!("event=sync_disconnect module=sync status=ok");
        Ok(())
    }

    /// Starts the periodic pull task. Returns whether a task was started.
    ///
    /// Requires a connected engine and a current Tokio runtime.
    pub fn start_polling(self: &Arc<Self>) -> bool {
        if !self.is_connected() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("event=sync_poll module=sync status=skipped reason=no_runtime");
            return false;
        };

        let token = CancellationToken::new();
        if let Ok(mut poller) = self.poller.lock() {
            if let Some(previous) = poller.replace(token.clone()) {
                previous.cancel();
            }
        }

        let engine = Arc::downgrade(self);
        let period = self.settings.poll_interval;
        runtime.spawn(poll_loop(engine, token, period));
        debug!(
            "event=sync_poll module=sync status=started interval_ms={}",
            period.as_millis()
        );
        true
    }

    pub fn stop_polling(&self) {
        if let Ok(mut poller) = self.poller.lock() {
            if let Some(token) = poller.take() {
                token.cancel();
                debug!("event=sync_poll module=sync status=stopped");
            }
        }
    }

    fn begin(&self, op: &str) -> SyncResult<Ticket> {
        let mut inner = self.lock_inner()?;
        let credentials = match (inner.state, inner.credentials.as_ref()) {
            (SyncState::Syncing, _) => {
                debug!("event=sync_{op} module=sync status=skipped reason=busy");
                return Err(SyncError::Busy);
            }
            (SyncState::Disabled, _) | (_, None) => return Err(SyncError::Disabled),
            (_, Some(credentials)) => credentials.clone(),
        };
        inner.state = SyncState::Syncing;
        debug!("event=sync_{op} module=sync status=start");
        Ok(Ticket {
            generation: inner.generation,
            credentials,
            started_at: Instant::now(),
        })
    }

    fn settle<V>(&self, ticket: &Ticket, op: &str, result: SyncResult<V>) -> SyncResult<V> {
        let mut inner = self.lock_inner()?;
        if inner.generation != ticket.generation {
            debug!("event=sync_{op} module=sync status=discarded reason=superseded");
            return Err(SyncError::Superseded);
        }
        self.finish(&mut inner, ticket, op, result)
    }

    fn finish<V>(
        &self,
        inner: &mut EngineState,
        ticket: &Ticket,
        op: &str,
        result: SyncResult<V>,
    ) -> SyncResult<V> {
        let duration_ms = ticket.started_at.elapsed().as_millis();
        match &result {
            Ok(_) => {
                inner.state = SyncState::Idle;
                inner.last_sync = Some(Utc::now());
                inner.last_error = None;
                info!("event=sync_{op} module=sync status=ok duration_ms={duration_ms}");
                if inner.connected {
                    if let Err(err) = self.persist(inner) {
                        warn!("event=sync_config_save module=sync status=error error={err}");
                    }
                }
            }
            Err(err) => {
                inner.state = SyncState::Error;
                inner.last_error = Some(err.to_string());
                warn!(
                    "event=sync_{op} module=sync status=error duration_ms={duration_ms} error_code={}",
                    err.code()
                );
            }
        }
        result
    }

    fn reset_to_disabled(&self) -> SyncResult<()> {
        let mut inner = self.lock_inner()?;
        inner.generation += 1;
        inner.state = SyncState::Disabled;
        inner.connected = false;
        inner.credentials = None;
        inner.last_error = None;
        self.persist(&inner)
    }

    fn persist(&self, inner: &EngineState) -> SyncResult<()> {
        inner.config_document().save(&self.config_repo)
    }

    fn lock_inner(&self) -> SyncResult<MutexGuard<'_, EngineState>> {
        self.inner.lock().map_err(|_| SyncError::LockPoisoned)
    }
}

/// Outbound half of the engine as seen by the mutation API.
#[async_trait]
pub trait SyncHook: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Best-effort push of the current shared store.
    async fn push_snapshot(&self) -> SyncResult<()>;
}

#[async_trait]
impl<R, T> SyncHook for SyncEngine<R, T>
where
    R: DocumentRepository + Send + Sync + 'static,
    T: RemoteDocument + 'static,
{
    fn is_connected(&self) -> bool {
        SyncEngine::is_connected(self)
    }

    async fn push_snapshot(&self) -> SyncResult<()> {
        self.push_local().await
    }
}

async fn poll_loop<R, T>(
    engine: Weak<SyncEngine<R, T>>,
    token: CancellationToken,
    period: std::time::Duration,
) where
    R: DocumentRepository + Send + Sync + 'static,
    T: RemoteDocument + 'static,
{
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = ticker.tick() => {
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                match engine.pull_remote().await {
                    Ok(outcome) => debug!("event=sync_poll module=sync status=ok outcome={outcome:?}"),
                    Err(SyncError::Busy | SyncError::Superseded) => {}
                    Err(err) => {
                        // Nobody is waiting on a timer tick; drop the error after logging.
                        engine.take_error();
                        warn!("event=sync_poll module=sync status=error error_code={}", err.code());
                    }
                }
            }
        }
    }
    debug!("event=sync_poll module=sync status=exited");
}
