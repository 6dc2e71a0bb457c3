use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{Mood, NewNote, NotePatch, Progress};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed with {status}: {message}")]
    RequestFailed { status: StatusCode, message: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Note as it arrives over the wire, before normalization.
///
/// Every field is optional and loosely typed; `crate::sync::normalize` turns
/// it into a [`crate::models::Note`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Optional list filters. Absent values are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub q: Option<String>,
    pub tags: Vec<String>,
    pub archived: Option<bool>,
    pub mood: Option<Mood>,
}

impl ListParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(archived) = self.archived {
            pairs.push(("archived", archived.to_string()));
        }
        if let Some(mood) = self.mood {
            pairs.push(("mood", mood.to_string()));
        }
        pairs
    }
}

/// The note API as seen from the UI side.
#[async_trait]
pub trait NoteGateway {
    async fn list_notes(&self, params: &ListParams) -> Result<Vec<RawNote>, ClientError>;
    async fn get_note(&self, id: &str) -> Result<RawNote, ClientError>;
    async fn create_note(&self, fields: &NewNote) -> Result<RawNote, ClientError>;
    async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<RawNote, ClientError>;
    async fn delete_note(&self, id: &str) -> Result<(), ClientError>;
    async fn toggle_pin(&self, id: &str) -> Result<RawNote, ClientError>;
    async fn toggle_archive(&self, id: &str) -> Result<RawNote, ClientError>;
    async fn set_progress(&self, id: &str, progress: Progress) -> Result<RawNote, ClientError>;
    async fn list_tags(&self) -> Result<Vec<String>, ClientError>;
}

/// HTTP implementation of [`NoteGateway`]: one request per operation, no retries.
#[derive(Debug, Clone)]
pub struct NotesClient {
    http: Client,
    base_url: String,
}

impl NotesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        tracing::warn!("Note API answered {status}: {message}");
        Err(ClientError::RequestFailed { status, message })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Pull the human-readable message out of an `{"error"}` or `{"message"}` body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl NoteGateway for NotesClient {
    async fn list_notes(&self, params: &ListParams) -> Result<Vec<RawNote>, ClientError> {
        let request = self.request(Method::GET, "/notes").query(&params.query_pairs());
        self.send_json(request).await
    }

    async fn get_note(&self, id: &str) -> Result<RawNote, ClientError> {
        self.send_json(self.request(Method::GET, &format!("/notes/{id}")))
            .await
    }

    async fn create_note(&self, fields: &NewNote) -> Result<RawNote, ClientError> {
        self.send_json(self.request(Method::POST, "/notes").json(fields))
            .await
    }

    async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<RawNote, ClientError> {
        self.send_json(self.request(Method::PUT, &format!("/notes/{id}")).json(patch))
            .await
    }

    async fn delete_note(&self, id: &str) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, &format!("/notes/{id}")))
            .await?;
        Ok(())
    }

    async fn toggle_pin(&self, id: &str) -> Result<RawNote, ClientError> {
        self.send_json(self.request(Method::PATCH, &format!("/notes/{id}/pin")))
            .await
    }

    async fn toggle_archive(&self, id: &str) -> Result<RawNote, ClientError> {
        self.send_json(self.request(Method::PATCH, &format!("/notes/{id}/archive")))
            .await
    }

    async fn set_progress(&self, id: &str, progress: Progress) -> Result<RawNote, ClientError> {
        let request = self
            .request(Method::PATCH, &format!("/notes/{id}/progress"))
            .json(&json!({ "progress": progress.value() }));
        self.send_json(request).await
    }

    async fn list_tags(&self) -> Result<Vec<String>, ClientError> {
        self.send_json(self.request(Method::GET, "/tags")).await
    }
}
