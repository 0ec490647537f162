use std::fs;

mod backend_bridge;
mod controller;

use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use eframe::egui;
use url::Url;

use client_core::query::QuerySnapshot;
use client_core::upload::{PendingUpload, UploadSnapshot};
use client_core::UiStatus;
use shared::domain::DocumentId;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::spawn_backend_thread;
use controller::events::{err_label, UiErrorContext, UiEvent};
use controller::orchestration::dispatch_backend_command;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/api";
const SERVER_URL_ENV: &str = "DOCQA_SERVER_URL";

/// Answers longer than the long-answer threshold are shown truncated to
/// this many characters until expanded.
const ANSWER_PREVIEW_CHARS: usize = 500;

/// Desktop client for the document Q&A service.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Base URL of the document service, e.g. http://127.0.0.1:8000/api
    #[arg(long)]
    server_url: Option<String>,
}

fn resolve_server_url(
    flag: Option<String>,
    env: Option<String>,
) -> Result<String, url::ParseError> {
    let raw = flag
        .or(env)
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    Url::parse(&raw)?;
    Ok(raw)
}

fn human_readable_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else if value.fract() == 0.0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn answer_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(ANSWER_PREVIEW_CHARS).collect();
    preview.push('…');
    preview
}

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    upload: UploadSnapshot,
    query: QuerySnapshot,

    question_draft: String,
    selected_document: Option<DocumentId>,

    status: String,
    status_banner: Option<StatusBanner>,
    drag_hover: bool,
}

impl DesktopGuiApp {
    fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            upload: UploadSnapshot::default(),
            query: QuerySnapshot::default(),
            question_draft: String::new(),
            selected_document: None,
            status: "Ready".to_string(),
            status_banner: None,
            drag_hover: false,
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::UploadState(snapshot) => {
                    self.upload = snapshot;
                }
                UiEvent::QueryState(snapshot) => {
                    self.selected_document = snapshot.selected_document.clone();
                    self.query = snapshot;
                }
                UiEvent::Notice(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    self.status = format!("{} error: {}", err_label(err.category()), err.message());
                    // Query failures already render inside the answer
                    // card; only upload and startup faults get a banner.
                    if matches!(
                        err.context(),
                        UiErrorContext::BackendStartup | UiErrorContext::Upload
                    ) {
                        self.status_banner = Some(StatusBanner {
                            message: self.status.clone(),
                        });
                    }
                }
            }
        }
    }

    fn handle_file_drops(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        if hovering != self.drag_hover {
            self.drag_hover = hovering;
            self.dispatch(BackendCommand::SetDragActive(hovering));
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let mut files = Vec::new();
        for file in dropped {
            if let Some(bytes) = file.bytes {
                files.push(PendingUpload::new(file.name.clone(), bytes.to_vec()));
            } else if let Some(path) = file.path {
                match fs::read(&path) {
                    Ok(content) => {
                        let filename = path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .unwrap_or("document.txt")
                            .to_string();
                        files.push(PendingUpload::new(filename, content));
                    }
                    Err(err) => {
                        self.status = format!("Failed to read {}: {err}", path.display());
                    }
                }
            }
        }
        if !files.is_empty() {
            self.dispatch(BackendCommand::DropFiles(files));
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(
                    1.0,
                    egui::Color32::from_rgb(175, 96, 96),
                ))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_upload_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload document");
        ui.add_space(4.0);

        let busy = self.upload.status == UiStatus::Busy;
        let highlight = self.upload.drag_active || self.drag_hover;
        let fill = if highlight {
            ui.visuals().selection.bg_fill.gamma_multiply(0.3)
        } else {
            ui.visuals().faint_bg_color
        };

        egui::Frame::group(ui.style())
            .fill(fill)
            .inner_margin(egui::Margin::symmetric(14, 18))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                match &self.upload.pending {
                    Some(pending) => {
                        ui.strong(&pending.filename);
                        ui.small(human_readable_bytes(pending.size_bytes));
                    }
                    None => {
                        ui.label("Drag a .txt file here, or browse below.");
                    }
                }
            });

        ui.add_space(6.0);
        let mut select = None;
        let mut clear = false;
        let mut submit = false;
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Browse…")).clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Text documents", &["txt"])
                    .pick_file()
                {
                    match fs::read(&path) {
                        Ok(content) => {
                            let filename = path
                                .file_name()
                                .and_then(|name| name.to_str())
                                .unwrap_or("document.txt")
                                .to_string();
                            select = Some(PendingUpload::new(filename, content));
                        }
                        Err(err) => {
                            self.status = format!("Failed to read {}: {err}", path.display());
                        }
                    }
                }
            }
            let has_pending = self.upload.pending.is_some();
            if ui
                .add_enabled(has_pending && !busy, egui::Button::new("Clear"))
                .clicked()
            {
                clear = true;
            }
            if ui
                .add_enabled(has_pending && !busy, egui::Button::new("Upload"))
                .clicked()
            {
                submit = true;
            }
            if busy {
                ui.spinner();
                ui.small("Uploading…");
            }
        });

        if let Some(pending) = select {
            self.dispatch(BackendCommand::SelectFile {
                filename: pending.filename,
                content: pending.content,
            });
        }
        if clear {
            self.dispatch(BackendCommand::ClearSelection);
        }
        if submit {
            self.dispatch(BackendCommand::SubmitUpload);
        }
    }

    fn selected_document_label(&self) -> String {
        match &self.selected_document {
            None => "All documents".to_string(),
            Some(id) => self
                .query
                .documents
                .iter()
                .find(|doc| &doc.id == id)
                .map(|doc| doc.title.clone())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    fn show_query_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Ask a question");
        ui.add_space(4.0);

        let busy = self.query.status == UiStatus::Busy;
        let mut refresh = false;
        let mut new_selection: Option<Option<DocumentId>> = None;

        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("document_combo")
                .selected_text(self.selected_document_label())
                .width(220.0)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(self.selected_document.is_none(), "All documents")
                        .clicked()
                    {
                        new_selection = Some(None);
                    }
                    for doc in &self.query.documents {
                        let selected = self.selected_document.as_ref() == Some(&doc.id);
                        if ui.selectable_label(selected, &doc.title).clicked() {
                            new_selection = Some(Some(doc.id.clone()));
                        }
                    }
                });
            if ui
                .button("⟳")
                .on_hover_text("Refresh document list")
                .clicked()
            {
                refresh = true;
            }
            ui.small(format!("{} documents", self.query.documents.len()));
        });

        if let Some(selection) = new_selection {
            self.selected_document = selection.clone();
            self.dispatch(BackendCommand::SetSelectedDocument(selection));
        }
        if refresh {
            self.dispatch(BackendCommand::LoadDocuments);
        }

        ui.add_space(6.0);
        ui.add(
            egui::TextEdit::multiline(&mut self.question_draft)
                .hint_text("Ask a question about your documents")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        let can_ask = !busy && !self.question_draft.trim().is_empty();
        let mut ask = false;
        ui.horizontal(|ui| {
            if ui.add_enabled(can_ask, egui::Button::new("Ask")).clicked() {
                ask = true;
            }
            if busy {
                ui.spinner();
                ui.small("Waiting for answer…");
            }
        });
        if ask {
            self.dispatch(BackendCommand::SubmitQuery {
                question: self.question_draft.clone(),
            });
        }

        if let Some(answer) = self.query.answer.clone() {
            ui.add_space(8.0);
            let mut toggle = false;
            let mut copy = false;
            egui::Frame::group(ui.style())
                .inner_margin(egui::Margin::symmetric(12, 10))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let text = if answer.is_long() && !answer.expanded {
                        answer_preview(answer.text())
                    } else {
                        answer.text().to_string()
                    };
                    ui.label(text);
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        if answer.is_long() {
                            let label = if answer.expanded {
                                "Show less"
                            } else {
                                "Show more"
                            };
                            if ui.button(label).clicked() {
                                toggle = true;
                            }
                        }
                        if ui.button("Copy answer").clicked() {
                            copy = true;
                        }
                        ui.small(format!("{} characters", answer.text().chars().count()));
                    });
                });
            if toggle {
                self.dispatch(BackendCommand::ToggleAnswer);
            }
            if copy {
                self.dispatch(BackendCommand::CopyAnswer);
            }
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_file_drops(ctx);

        egui::TopBottomPanel::bottom("status_line").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small("Status:");
                ui.small(egui::RichText::new(&self.status).weak());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            ui.add_space(6.0);
            ui.columns(2, |columns| {
                self.show_upload_panel(&mut columns[0]);
                self.show_query_panel(&mut columns[1]);
            });
        });

        // Snapshots arrive from the backend thread; poll for them even
        // when there is no user input.
        ctx.request_repaint_after(std::time::Duration::from_millis(200));
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let server_url = match resolve_server_url(
        args.server_url,
        std::env::var(SERVER_URL_ENV).ok(),
    ) {
        Ok(url) => url,
        Err(err) => {
            tracing::error!("invalid server url: {err}");
            std::process::exit(2);
        }
    };
    tracing::info!(server_url = %server_url, "starting document q&a client");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    spawn_backend_thread(server_url, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Document Q&A")
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Document Q&A",
        options,
        Box::new(|_cc| Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx)))),
    )
}
