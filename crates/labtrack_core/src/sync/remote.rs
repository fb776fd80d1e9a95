//! Remote single-document store.
//!
//! # Responsibility
//! - Fetch and overwrite the tracked file of one remote document.
//! - Map HTTP outcomes to [`SyncError`] without touching local state.
//!
//! # Invariants
//! - `store` overwrites the tracked file wholesale; it never merges.
//! - A document without the tracked file fetches as `Ok(None)`.

use super::config::{SyncCredentials, SyncSettings, REMOTE_FILE_NAME};
use super::error::{SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::HashMap;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Transport seam between the sync engine and the remote document host.
#[async_trait]
pub trait RemoteDocument: Send + Sync {
    /// Returns the tracked file's content, or `None` when the file is absent.
    async fn fetch(&self, credentials: &SyncCredentials) -> SyncResult<Option<String>>;

    /// Replaces the tracked file's content.
    async fn store(&self, credentials: &SyncCredentials, content: &str) -> SyncResult<()>;
}

#[derive(Debug, Deserialize)]
struct GistDocument {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

/// Gist API client.
#[derive(Debug, Clone)]
pub struct GistClient {
    http: Client,
    api_base: String,
}

impl GistClient {
    pub fn new(settings: &SyncSettings) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        let user_agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|err| SyncError::Transport(format!("invalid user agent: {err}")))?;
        headers.insert(USER_AGENT, user_agent);

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn document_url(&self, gist_id: &str) -> String {
        format!("{}/gists/{}", self.api_base, gist_id)
    }

    fn authorized(builder: RequestBuilder, credentials: &SyncCredentials) -> RequestBuilder {
        builder.bearer_auth(&credentials.token)
    }

    async fn fetch_raw(&self, url: &str, credentials: &SyncCredentials) -> SyncResult<String> {
        let response = Self::authorized(self.http.get(url), credentials)
            .send()
            .await?;
        Ok(ensure_success(response).await?.text().await?)
    }
}

#[async_trait]
impl RemoteDocument for GistClient {
    async fn fetch(&self, credentials: &SyncCredentials) -> SyncResult<Option<String>> {
        let url = self.document_url(&credentials.gist_id);
        let response = Self::authorized(self.http.get(&url), credentials)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        let mut document: GistDocument = serde_json::from_str(&body)
            .map_err(|err| SyncError::InvalidPayload(format!("unreadable document: {err}")))?;

        let Some(file) = document.files.remove(REMOTE_FILE_NAME) else {
            return Ok(None);
        };
        match (file.truncated, file.raw_url, file.content) {
            (true, Some(raw_url), _) => Ok(Some(self.fetch_raw(&raw_url, credentials).await?)),
            (_, _, content) => Ok(content),
        }
    }

    async fn store(&self, credentials: &SyncCredentials, content: &str) -> SyncResult<()> {
        let url = self.document_url(&credentials.gist_id);
        let payload = serde_json::json!({
            "files": {
                REMOTE_FILE_NAME: { "content": content }
            }
        });
        let response = Self::authorized(self.http.patch(&url), credentials)
            .json(&payload)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::http(status.as_u16(), &body))
}

#[cfg(test)]
mod tests {
    use super::{GistClient, RemoteDocument};
    use crate::sync::config::{SyncCredentials, SyncSettings, REMOTE_FILE_NAME};
    use crate::sync::error::SyncError;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GistClient {
        GistClient::new(&SyncSettings::default().with_api_base(server.uri())).unwrap()
    }

    fn creds() -> SyncCredentials {
        SyncCredentials::new("tok", "abc123")
    }

    #[tokio::test]
    async fn fetch_returns_tracked_file_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gists/abc123"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": { REMOTE_FILE_NAME: { "content": "{\"goals\":[]}" } }
            })))
            .mount(&server)
            .await;

        let content = client(&server).fetch(&creds()).await.unwrap();
        assert_eq!(content.as_deref(), Some("{\"goals\":[]}"));
    }

    #[tokio::test]
    async fn fetch_without_tracked_file_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gists/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": { "other.txt": { "content": "x" } }
            })))
            .mount(&server)
            .await;

        assert_eq!(client(&server).fetch(&creds()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn fetch_follows_raw_url_for_truncated_files() {
        let server = MockServer::start().await;
        let raw_url = format!("{}/raw/data.json", server.uri());
        Mock::given(method("GET"))
            .and(path("/gists/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": { REMOTE_FILE_NAME: {
                    "content": "{\"stud",
                    "truncated": true,
                    "raw_url": raw_url
                } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"students\":[]}"))
            .mount(&server)
            .await;

        let content = client(&server).fetch(&creds()).await.unwrap();
        assert_eq!(content.as_deref(), Some("{\"students\":[]}"));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let err = client(&server).fetch(&creds()).await.unwrap_err();
        assert!(matches!(err, SyncError::Http { status: 401, .. }));
    }

    #[tokio::test]
    async fn store_patches_only_the_tracked_file() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/gists/abc123"))
            .and(body_json(serde_json::json!({
                "files": { REMOTE_FILE_NAME: { "content": "{}" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).store(&creds(), "{}").await.unwrap();
    }
}
