//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::SelectFile { .. } => "select_file",
        BackendCommand::DropFiles(_) => "drop_files",
        BackendCommand::ClearSelection => "clear_selection",
        BackendCommand::SetDragActive(_) => "set_drag_active",
        BackendCommand::SubmitUpload => "submit_upload",
        BackendCommand::LoadDocuments => "load_documents",
        BackendCommand::SetSelectedDocument(_) => "set_selected_document",
        BackendCommand::SubmitQuery { .. } => "submit_query",
        BackendCommand::ToggleAnswer => "toggle_answer",
        BackendCommand::CopyAnswer => "copy_answer",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend command processor disconnected; restart the app".to_string();
        }
    }
}
