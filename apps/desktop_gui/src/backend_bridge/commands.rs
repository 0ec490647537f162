//! Backend commands queued from UI to backend worker.

use client_core::upload::PendingUpload;
use shared::domain::DocumentId;

pub enum BackendCommand {
    SelectFile {
        filename: String,
        content: Vec<u8>,
    },
    DropFiles(Vec<PendingUpload>),
    ClearSelection,
    SetDragActive(bool),
    SubmitUpload,
    LoadDocuments,
    SetSelectedDocument(Option<DocumentId>),
    SubmitQuery {
        question: String,
    },
    ToggleAnswer,
    CopyAnswer,
}
