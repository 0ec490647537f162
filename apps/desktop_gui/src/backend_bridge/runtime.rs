//! Backend worker thread: owns the tokio runtime, the two controllers,
//! and the service client. Commands come in over a crossbeam channel,
//! snapshots and notifications go back out as [`UiEvent`]s.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast;

use client_core::query::QueryController;
use client_core::upload::{PendingUpload, UploadController};
use client_core::{Clipboard, HttpDocumentService, Notification};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// arboard's handle is not `Send`, so a fresh one is opened per copy.
struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }
}

fn notification_event(notification: Notification) -> UiEvent {
    match notification {
        Notification::UploadSucceeded { filename } => {
            UiEvent::Notice(format!("Uploaded {filename}"))
        }
        Notification::UploadFailed { filename, reason } => UiEvent::Error(UiError::from_message(
            UiErrorContext::Upload,
            format!("Upload of {filename} failed: {reason}"),
        )),
        Notification::DocumentListLoaded { count } => {
            UiEvent::Notice(format!("Loaded {count} documents"))
        }
        Notification::DocumentListFailed { reason } => UiEvent::Error(UiError::from_message(
            UiErrorContext::Query,
            format!("Failed to load document list: {reason}"),
        )),
        Notification::AnswerReady => UiEvent::Notice("Answer ready".to_string()),
        Notification::AnswerCopied => UiEvent::Notice("Answer copied to clipboard".to_string()),
        Notification::AnswerCopyFailed { reason } => UiEvent::Error(UiError::from_message(
            UiErrorContext::Query,
            format!("Failed to copy answer: {reason}"),
        )),
    }
}

fn forward_upload_events(
    controller: Arc<UploadController>,
    mut events: broadcast::Receiver<Notification>,
    ui_tx: Sender<UiEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(notification) = events.recv().await {
            let _ = ui_tx.try_send(notification_event(notification));
            let _ = ui_tx.try_send(UiEvent::UploadState(controller.snapshot().await));
        }
    })
}

fn forward_query_events(
    controller: Arc<QueryController>,
    mut events: broadcast::Receiver<Notification>,
    ui_tx: Sender<UiEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(notification) = events.recv().await {
            let _ = ui_tx.try_send(notification_event(notification));
            let _ = ui_tx.try_send(UiEvent::QueryState(controller.snapshot().await));
        }
    })
}

pub fn spawn_backend_thread(
    server_url: String,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let service = Arc::new(HttpDocumentService::new(server_url));
            let upload = UploadController::new(service.clone());
            let query = QueryController::new_with_clipboard(service, Arc::new(SystemClipboard));

            let upload_task =
                forward_upload_events(upload.clone(), upload.subscribe_events(), ui_tx.clone());
            let query_task =
                forward_query_events(query.clone(), query.subscribe_events(), ui_tx.clone());

            query.load_document_list().await;
            let _ = ui_tx.try_send(UiEvent::QueryState(query.snapshot().await));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::SelectFile { filename, content } => {
                        upload.select_file(PendingUpload::new(filename, content)).await;
                    }
                    BackendCommand::DropFiles(files) => {
                        upload.handle_drop(files).await;
                    }
                    BackendCommand::ClearSelection => {
                        upload.clear_selection().await;
                    }
                    BackendCommand::SetDragActive(active) => {
                        upload.set_drag_active(active).await;
                    }
                    BackendCommand::SubmitUpload => {
                        upload.submit().await;
                    }
                    BackendCommand::LoadDocuments => {
                        query.load_document_list().await;
                    }
                    BackendCommand::SetSelectedDocument(document) => {
                        query.set_selected_document(document).await;
                    }
                    BackendCommand::SubmitQuery { question } => {
                        query.set_question_text(question).await;
                        query.submit_query().await;
                    }
                    BackendCommand::ToggleAnswer => {
                        query.toggle_expanded().await;
                    }
                    BackendCommand::CopyAnswer => {
                        query.copy_answer_to_clipboard().await;
                    }
                }
                let _ = ui_tx.try_send(UiEvent::UploadState(upload.snapshot().await));
                let _ = ui_tx.try_send(UiEvent::QueryState(query.snapshot().await));
            }

            // UI side hung up; stop any in-flight request before exit.
            upload.shutdown().await;
            query.shutdown().await;
            upload_task.abort();
            query_task.abort();
            tracing::info!("backend worker shutting down");
        });
    });
}
