//! Document ingestion workflow: hold at most one pending file, submit
//! it to the document service, and report the outcome without ever
//! losing the user's selection on failure.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{DocumentService, Notification, UiStatus};

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;

/// A file the user has picked but not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub filename: String,
    pub size_bytes: u64,
    pub content: Vec<u8>,
}

impl PendingUpload {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }
}

/// Cloneable view of the upload workflow for rendering.
#[derive(Debug, Clone, Default)]
pub struct UploadSnapshot {
    pub pending: Option<PendingUpload>,
    pub status: UiStatus,
    pub drag_active: bool,
}

#[derive(Default)]
struct UploadState {
    pending: Option<PendingUpload>,
    status: UiStatus,
    drag_active: bool,
    inflight: Option<JoinHandle<()>>,
}

pub struct UploadController {
    service: Arc<dyn DocumentService>,
    inner: Mutex<UploadState>,
    events: broadcast::Sender<Notification>,
}

impl UploadController {
    pub fn new(service: Arc<dyn DocumentService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            service,
            inner: Mutex::new(UploadState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Replaces any existing selection. No validation of content or
    /// extension happens here; the service is the arbiter.
    pub async fn select_file(&self, upload: PendingUpload) {
        let mut state = self.inner.lock().await;
        state.pending = Some(upload);
    }

    /// Drop payloads may carry several files; the first wins and the
    /// rest are ignored. Always deactivates the drop highlight.
    pub async fn handle_drop(&self, mut files: Vec<PendingUpload>) {
        let mut state = self.inner.lock().await;
        state.drag_active = false;
        if files.is_empty() {
            return;
        }
        if files.len() > 1 {
            info!(extra = files.len() - 1, "ignoring extra dropped files");
        }
        state.pending = Some(files.swap_remove(0));
    }

    pub async fn set_drag_active(&self, active: bool) {
        let mut state = self.inner.lock().await;
        state.drag_active = active;
    }

    pub async fn clear_selection(&self) {
        let mut state = self.inner.lock().await;
        state.pending = None;
    }

    /// Kicks off the upload. Returns false without side effects when
    /// nothing is selected or a submission is already in flight.
    pub async fn submit(self: &Arc<Self>) -> bool {
        let upload = {
            let mut state = self.inner.lock().await;
            if state.status == UiStatus::Busy {
                return false;
            }
            let Some(upload) = state.pending.clone() else {
                return false;
            };
            state.status = UiStatus::Busy;
            upload
        };

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let result = controller
                .service
                .upload_document(&upload.filename, upload.content.clone())
                .await;

            let mut state = controller.inner.lock().await;
            state.status = UiStatus::Idle;
            state.inflight = None;
            match result {
                Ok(_) => {
                    info!(filename = %upload.filename, "document uploaded");
                    state.pending = None;
                    let _ = controller.events.send(Notification::UploadSucceeded {
                        filename: upload.filename,
                    });
                }
                Err(err) => {
                    // Selection is retained so the user can retry.
                    warn!(filename = %upload.filename, error = %err, "upload failed");
                    let _ = controller.events.send(Notification::UploadFailed {
                        filename: upload.filename,
                        reason: err.to_string(),
                    });
                }
            }
        });

        self.inner.lock().await.inflight = Some(handle);
        true
    }

    /// Aborts any in-flight submission so a hung request cannot leave
    /// the workflow stuck in Busy after teardown.
    pub async fn shutdown(&self) {
        let mut state = self.inner.lock().await;
        if let Some(handle) = state.inflight.take() {
            handle.abort();
        }
        state.status = UiStatus::Idle;
    }

    pub async fn snapshot(&self) -> UploadSnapshot {
        let state = self.inner.lock().await;
        UploadSnapshot {
            pending: state.pending.clone(),
            status: state.status,
            drag_active: state.drag_active,
        }
    }
}
