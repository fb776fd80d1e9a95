//! Sync settings, credentials and the persisted sync configuration document.
//!
//! # Invariants
//! - Blank credentials count as absent.
//! - `syncing` is written for compatibility but always restored as `false`.

use super::error::SyncResult;
use crate::repo::document_repo::{DocumentRepository, SYNC_CONFIG_KEY};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// File inside the remote document that holds the lab data.
pub const REMOTE_FILE_NAME: &str = "research-lab-data.json";

/// Process-level sync tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Base URL of the gist API, without trailing slash.
    pub api_base: String,
    pub poll_interval: Duration,
    pub user_agent: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            user_agent: format!("labtrack/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SyncSettings {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Bearer token plus the id of the remote document.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncCredentials {
    pub token: String,
    pub gist_id: String,
}

impl SyncCredentials {
    pub fn new(token: impl Into<String>, gist_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            gist_id: gist_id.into(),
        }
    }

    /// Trimmed copy, or `None` when either part is blank.
    pub fn normalized(&self) -> Option<Self> {
        let token = self.token.trim();
        let gist_id = self.gist_id.trim();
        if token.is_empty() || gist_id.is_empty() {
            return None;
        }
        Some(Self::new(token, gist_id))
    }
}

impl Debug for SyncCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCredentials")
            .field("token", &"<redacted>")
            .field("gist_id", &self.gist_id)
            .finish()
    }
}

/// Wire shape of the persisted sync configuration.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfigDocument {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub gist_id: String,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub syncing: bool,
}

impl SyncConfigDocument {
    pub fn credentials(&self) -> Option<SyncCredentials> {
        SyncCredentials::new(self.token.as_str(), self.gist_id.as_str()).normalized()
    }

    /// Reads the stored configuration; unreadable content falls back to default.
    pub fn load(repo: &impl DocumentRepository) -> SyncResult<Self> {
        let Some(body) = repo.read_document(SYNC_CONFIG_KEY)? else {
            return Ok(Self::default());
        };
        let mut config = serde_json::from_str::<Self>(&body).unwrap_or_else(|err| {
            warn!("event=sync_config_load module=sync status=fallback error={err}");
            Self::default()
        });
        config.syncing = false;
        Ok(config)
    }

    pub fn save(&self, repo: &impl DocumentRepository) -> SyncResult<()> {
        let body = serde_json::to_string(self)
            .map_err(crate::store::StoreError::Encode)?;
        repo.write_document(SYNC_CONFIG_KEY, &body)?;
        Ok(())
    }
}

impl Debug for SyncConfigDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfigDocument")
            .field("token", &"<redacted>")
            .field("gist_id", &self.gist_id)
            .field("last_sync", &self.last_sync)
            .field("sync_enabled", &self.sync_enabled)
            .field("syncing", &self.syncing)
            .finish()
    }
}
