use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DocumentId;

/// One entry of the `GET /documents` listing. `id` and `title` are
/// required; the service also reports ingestion metadata which older
/// deployments omit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /documents/query`. A `None` document id serializes as
/// JSON `null`, which the service interprets as "search all documents".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHttpRequest {
    pub document_id: Option<DocumentId>,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

/// Body of a successful `POST /documents/upload`. Every field is
/// advisory; a 2xx status is the success indicator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
