//! Question/answer workflow: document list, selection, question text,
//! and the lifecycle of the current answer.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared::domain::DocumentId;
use shared::protocol::DocumentSummary;

use crate::{
    Clipboard, DocumentService, MissingClipboard, Notification, UiStatus, LONG_ANSWER_THRESHOLD,
    QUERY_FAILURE_TEXT,
};

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;

/// What a submitted question resolved to. A failure keeps its internal
/// reason for logging but always renders as [`QUERY_FAILURE_TEXT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub outcome: AnswerOutcome,
    pub expanded: bool,
}

impl AnswerResult {
    pub fn text(&self) -> &str {
        match &self.outcome {
            AnswerOutcome::Answered(text) => text,
            AnswerOutcome::Failed(_) => QUERY_FAILURE_TEXT,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, AnswerOutcome::Failed(_))
    }

    pub fn is_long(&self) -> bool {
        self.text().chars().count() > LONG_ANSWER_THRESHOLD
    }
}

/// Cloneable view of the query workflow for rendering.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub documents: Vec<DocumentSummary>,
    pub selected_document: Option<DocumentId>,
    pub question_text: String,
    pub answer: Option<AnswerResult>,
    pub status: UiStatus,
}

#[derive(Default)]
struct QueryState {
    documents: Vec<DocumentSummary>,
    selected_document: Option<DocumentId>,
    question_text: String,
    answer: Option<AnswerResult>,
    status: UiStatus,
    inflight: Option<JoinHandle<()>>,
}

pub struct QueryController {
    service: Arc<dyn DocumentService>,
    clipboard: Arc<dyn Clipboard>,
    inner: Mutex<QueryState>,
    events: broadcast::Sender<Notification>,
}

impl QueryController {
    pub fn new(service: Arc<dyn DocumentService>) -> Arc<Self> {
        Self::new_with_clipboard(service, Arc::new(MissingClipboard))
    }

    pub fn new_with_clipboard(
        service: Arc<dyn DocumentService>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            service,
            clipboard,
            inner: Mutex::new(QueryState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Wholesale refresh of the document list. A failure leaves the
    /// list empty and is only notified; search-all queries still work.
    pub async fn load_document_list(&self) {
        match self.service.list_documents().await {
            Ok(documents) => {
                let count = documents.len();
                let mut state = self.inner.lock().await;
                // Drop a selection that no longer resolves to a document.
                if let Some(selected) = &state.selected_document {
                    if !documents.iter().any(|d| &d.id == selected) {
                        state.selected_document = None;
                    }
                }
                state.documents = documents;
                debug!(count, "document list refreshed");
                let _ = self
                    .events
                    .send(Notification::DocumentListLoaded { count });
            }
            Err(err) => {
                warn!(error = %err, "failed to load document list");
                self.inner.lock().await.documents.clear();
                let _ = self.events.send(Notification::DocumentListFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    /// `None` selects "all documents".
    pub async fn set_selected_document(&self, document: Option<DocumentId>) {
        let mut state = self.inner.lock().await;
        state.selected_document = document;
    }

    pub async fn set_question_text(&self, text: impl Into<String>) {
        let mut state = self.inner.lock().await;
        state.question_text = text.into();
    }

    /// Submits the current question. Returns false without side effects
    /// when the question is blank or a query is already in flight.
    pub async fn submit_query(self: &Arc<Self>) -> bool {
        let (question, document_id) = {
            let mut state = self.inner.lock().await;
            if state.status == UiStatus::Busy {
                return false;
            }
            if state.question_text.trim().is_empty() {
                return false;
            }
            state.status = UiStatus::Busy;
            state.answer = None;
            (state.question_text.clone(), state.selected_document.clone())
        };

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let result = controller
                .service
                .query_documents(document_id.as_ref(), &question)
                .await;

            let outcome = match result {
                Ok(answer) => {
                    info!(chars = answer.chars().count(), "answer received");
                    AnswerOutcome::Answered(answer)
                }
                Err(err) => {
                    warn!(error = %err, "query failed");
                    AnswerOutcome::Failed(err.to_string())
                }
            };

            let mut state = controller.inner.lock().await;
            state.status = UiStatus::Idle;
            state.inflight = None;
            state.answer = Some(AnswerResult {
                outcome,
                expanded: false,
            });
            let _ = controller.events.send(Notification::AnswerReady);
        });

        self.inner.lock().await.inflight = Some(handle);
        true
    }

    /// Flips the expanded flag of the current answer. No-op when there
    /// is no answer.
    pub async fn toggle_expanded(&self) {
        let mut state = self.inner.lock().await;
        if let Some(answer) = state.answer.as_mut() {
            answer.expanded = !answer.expanded;
        }
    }

    /// Best-effort copy of the displayed answer text. Never changes the
    /// workflow status; the outcome is only notified.
    pub async fn copy_answer_to_clipboard(&self) {
        let text = {
            let state = self.inner.lock().await;
            match &state.answer {
                Some(answer) => answer.text().to_string(),
                None => return,
            }
        };
        match self.clipboard.set_text(&text) {
            Ok(()) => {
                let _ = self.events.send(Notification::AnswerCopied);
            }
            Err(err) => {
                warn!(error = %err, "clipboard copy failed");
                let _ = self.events.send(Notification::AnswerCopyFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Aborts any in-flight query so teardown cannot leave Busy stuck.
    pub async fn shutdown(&self) {
        let mut state = self.inner.lock().await;
        if let Some(handle) = state.inflight.take() {
            handle.abort();
        }
        state.status = UiStatus::Idle;
    }

    pub async fn snapshot(&self) -> QuerySnapshot {
        let state = self.inner.lock().await;
        QuerySnapshot {
            documents: state.documents.clone(),
            selected_document: state.selected_document.clone(),
            question_text: state.question_text.clone(),
            answer: state.answer.clone(),
            status: state.status,
        }
    }
}
