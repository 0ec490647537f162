use serde::{Deserialize, Serialize};

/// Error body the document service attaches to non-2xx responses,
/// e.g. `{"error": "Question required"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
