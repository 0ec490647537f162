//! Behavioral core of the document Q&A client: the service client that
//! talks to the document service over HTTP, and the two controllers
//! (`upload`, `query`) that own all interaction state. The presentation
//! shell subscribes to [`Notification`]s and renders snapshots; it makes
//! no decisions of its own.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use shared::domain::DocumentId;
use shared::error::ApiError;
use shared::protocol::{AnswerResponse, DocumentSummary, QueryHttpRequest, UploadResponse};

pub mod query;
pub mod upload;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

/// Answers longer than this (in characters) start collapsed in the UI.
pub const LONG_ANSWER_THRESHOLD: usize = 500;

/// The one failure string the query workflow ever shows the user.
pub const QUERY_FAILURE_TEXT: &str = "Failed to get answer. Please try again.";

/// Per-controller interaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiStatus {
    #[default]
    Idle,
    Busy,
    Error,
}

/// Failures from the document service. The controllers treat every
/// variant the same way (transient, return to Idle); the split exists
/// for logging and for the HTTP client's own tests.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed service response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Transient, non-blocking notifications the controllers broadcast to
/// whatever shell is listening. Replaces modal alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    UploadSucceeded { filename: String },
    UploadFailed { filename: String, reason: String },
    DocumentListLoaded { count: usize },
    DocumentListFailed { reason: String },
    AnswerReady,
    AnswerCopied,
    AnswerCopyFailed { reason: String },
}

/// Seam between the query controller and the host clipboard.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> anyhow::Result<()>;
}

/// Placeholder used until the shell wires a real clipboard in.
pub struct MissingClipboard;

impl Clipboard for MissingClipboard {
    fn set_text(&self, _text: &str) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("no clipboard backend configured"))
    }
}

/// Operations the controllers need from the document service.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn upload_document(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<UploadResponse, ServiceError>;

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ServiceError>;

    async fn query_documents(
        &self,
        document_id: Option<&DocumentId>,
        question: &str,
    ) -> Result<String, ServiceError>;
}

/// Reqwest-backed [`DocumentService`] against a base URL fixed at
/// construction, e.g. `http://127.0.0.1:8000/api`.
pub struct HttpDocumentService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDocumentService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx response into a [`ServiceError::Status`], pulling
    /// the human-readable message out of the service's `{"error": ...}`
    /// body when there is one.
    async fn status_error(status: StatusCode, response: reqwest::Response) -> ServiceError {
        let message = match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => api.error,
                Err(_) => body,
            },
            Err(_) => String::new(),
        };
        ServiceError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn upload_document(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<UploadResponse, ServiceError> {
        let response = self
            .http
            .post(self.endpoint("/documents/upload"))
            .query(&[("filename", filename)])
            .body(content)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }
        response
            .json::<UploadResponse>()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ServiceError> {
        let response = self.http.get(self.endpoint("/documents")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        // Validate entry by entry so one malformed record cannot take
        // down the whole listing.
        let raw: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let mut documents = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_value::<DocumentSummary>(entry.clone()) {
                Ok(summary) => documents.push(summary),
                Err(err) => {
                    tracing::warn!(%entry, error = %err, "skipping malformed document entry");
                }
            }
        }
        Ok(documents)
    }

    async fn query_documents(
        &self,
        document_id: Option<&DocumentId>,
        question: &str,
    ) -> Result<String, ServiceError> {
        let body = QueryHttpRequest {
            document_id: document_id.cloned(),
            question: question.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("/documents/query"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }
        let answer: AnswerResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;
        Ok(answer.answer)
    }
}
