use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::page::{Page, Panel};
use crate::constants::{
    CHAT_LOCKED_INFO, PREVIEW_LINES, SPINNER_FRAMES, UPLOAD_FIRST_WARNING,
};
use crate::document::{extract_text, is_pdf_path, preview_lines};
use crate::models::StreamCallback;
use crate::rag::{ChatbotManager, EmbeddingsManager};
use crate::session::SessionState;
use crate::utils::{DocChatError, Result};

/// Builds the chatbot attached after the first successful embedding run
pub type ChatbotFactory = Arc<dyn Fn() -> Result<ChatbotManager> + Send + Sync>;

/// Messages from background tasks to the UI loop
#[derive(Debug)]
pub enum UiEvent {
    EmbeddingsFinished(Result<String>),
    /// Text preview for the upload with this sequence number
    PreviewReady { upload: u64, lines: Vec<String> },
    ResponseToken(String),
    ResponseFinished(Result<String>),
}

pub type EventSender = mpsc::UnboundedSender<UiEvent>;

/// Editor state, as in vi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Normal,
    Insert,
    Command,
}

/// A status box shown inside a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Info(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

/// What the Upload column shows after a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub size_bytes: u64,
    /// Empty until the background extraction reports back
    pub preview: Vec<String>,
}

/// Collaborators the UI calls into
#[derive(Clone)]
pub struct AppServices {
    pub embeddings: Arc<EmbeddingsManager>,
    pub chatbot_factory: ChatbotFactory,
    /// Where uploads are copied
    pub upload_path: PathBuf,
    pub max_file_size: u64,
    pub contact_email: String,
    pub llm_model: String,
    pub embedding_model: String,
}

/// Application state
pub struct App {
    pub session: SessionState,
    services: AppServices,
    pub page: Page,
    pub focus: Panel,
    pub state: AppState,
    pub running: bool,
    pub show_sidebar: bool,

    /// Path typed into the Upload column
    pub upload_input: String,
    /// Message typed into the Chat column
    pub chat_input: String,
    /// Text after ':' in Command state
    pub command_input: String,

    pub uploaded: Option<UploadedFile>,
    pub upload_notice: Option<Notice>,
    /// Bumped on every successful upload so stale previews are dropped
    upload_seq: u64,

    pub embeddings_checked: bool,
    pub embeddings_running: bool,
    pub embeddings_notice: Option<Notice>,

    pub is_responding: bool,
    /// Streamed text of the answer in progress
    pub current_response: String,
    /// Lines scrolled up from the bottom of the chat
    pub scroll_offset: u16,
    /// Wrapped chat rows hidden above the viewport, as of the last frame
    pub(crate) chat_max_scroll: Cell<u16>,

    pub status_message: Option<String>,
    /// Advanced on every UI tick
    pub tick: usize,
}

impl App {
    pub fn new(services: AppServices, show_sidebar: bool) -> Self {
        Self {
            session: SessionState::new(),
            services,
            page: Page::default(),
            focus: Panel::default(),
            state: AppState::default(),
            running: true,
            show_sidebar,
            upload_input: String::new(),
            chat_input: String::new(),
            command_input: String::new(),
            uploaded: None,
            upload_notice: None,
            upload_seq: 0,
            embeddings_checked: false,
            embeddings_running: false,
            embeddings_notice: None,
            is_responding: false,
            current_response: String::new(),
            scroll_offset: 0,
            chat_max_scroll: Cell::new(0),
            status_message: None,
            tick: 0,
        }
    }

    pub fn contact_email(&self) -> &str {
        &self.services.contact_email
    }

    pub fn llm_model(&self) -> &str {
        &self.services.llm_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.services.embedding_model
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()]
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn toggle_sidebar(&mut self) {
        self.show_sidebar = !self.show_sidebar;
    }

    pub fn go_to(&mut self, page: Page) {
        self.page = page;
        self.set_status(format!("Page: {}", page.display_name()));
    }

    /// Text box that Insert state currently types into
    pub fn active_input(&mut self) -> Option<&mut String> {
        if self.page != Page::Chatbot {
            return None;
        }
        match self.focus {
            Panel::Upload => Some(&mut self.upload_input),
            Panel::Chat if self.session.has_chatbot() => Some(&mut self.chat_input),
            _ => None,
        }
    }

    /// Copy a PDF into the upload location and remember it for embedding.
    /// The preview is extracted off the UI loop and arrives as `PreviewReady`.
    pub fn upload(&mut self, path: &Path, tx: &EventSender) {
        if !is_pdf_path(path) {
            self.upload_notice = Some(Notice::Warning(format!(
                "⚠️ Only PDF files can be uploaded: {}",
                path.display()
            )));
            return;
        }

        match self.copy_upload(path) {
            Ok((uploaded, bytes)) => {
                info!(file = %uploaded.file_name, bytes = uploaded.size_bytes, "Uploaded document");
                self.session.set_document(self.services.upload_path.clone());
                self.uploaded = Some(uploaded);
                self.upload_notice = Some(Notice::Success(
                    "📄 File Uploaded Successfully!".to_string(),
                ));
                self.upload_input.clear();

                self.upload_seq += 1;
                let upload = self.upload_seq;
                let tx = tx.clone();
                tokio::spawn(async move {
                    let lines = tokio::task::spawn_blocking(move || build_preview(&bytes))
                        .await
                        .unwrap_or_else(|e| vec![format!("(preview unavailable: {})", e)]);
                    let _ = tx.send(UiEvent::PreviewReady { upload, lines });
                });
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                self.upload_notice = Some(Notice::Error(e.user_message()));
            }
        }
    }

    fn copy_upload(&self, path: &Path) -> Result<(UploadedFile, Vec<u8>)> {
        if !path.is_file() {
            return Err(DocChatError::FileNotFound(format!(
                "The file {} does not exist.",
                path.display()
            )));
        }

        let bytes = std::fs::read(path)?;
        let size_bytes = bytes.len() as u64;
        if size_bytes > self.services.max_file_size {
            return Err(DocChatError::InvalidDocument(format!(
                "File too large: {} bytes (max {} bytes)",
                size_bytes, self.services.max_file_size
            )));
        }

        let destination = &self.services.upload_path;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, &bytes)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let uploaded = UploadedFile {
            file_name,
            size_bytes,
            preview: Vec::new(),
        };
        Ok((uploaded, bytes))
    }

    /// Flip the "Create Embeddings" checkbox. Turning it on starts one run.
    pub fn toggle_embeddings(&mut self, tx: &EventSender) {
        if self.embeddings_running {
            self.set_status("Embeddings are already being created");
            return;
        }

        self.embeddings_checked = !self.embeddings_checked;
        if !self.embeddings_checked {
            return;
        }

        let Some(pdf_path) = self.session.temp_pdf_path.clone() else {
            self.embeddings_notice = Some(Notice::Warning(UPLOAD_FIRST_WARNING.to_string()));
            return;
        };

        self.embeddings_running = true;
        self.embeddings_notice = None;

        let manager = self.services.embeddings.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = manager.create_embeddings(&pdf_path).await;
            let _ = tx.send(UiEvent::EmbeddingsFinished(result));
        });
    }

    /// Send the typed chat message
    pub fn send_message(&mut self, tx: &EventSender) {
        let Some(chatbot) = self.session.chatbot() else {
            self.set_status(CHAT_LOCKED_INFO);
            return;
        };
        if self.is_responding {
            return;
        }

        let question = self.chat_input.trim().to_string();
        if question.is_empty() {
            return;
        }

        self.chat_input.clear();
        self.session.push_user(question.clone());
        self.is_responding = true;
        self.current_response.clear();
        self.scroll_offset = 0;

        let token_tx = tx.clone();
        let done_tx = tx.clone();
        tokio::spawn(async move {
            let callback: StreamCallback = Arc::new(move |delta: &str| {
                let _ = token_tx.send(UiEvent::ResponseToken(delta.to_string()));
            });
            let result = chatbot.stream_response(&question, Some(callback)).await;
            let _ = done_tx.send(UiEvent::ResponseFinished(result));
        });
    }

    /// Apply a background task result
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::EmbeddingsFinished(result) => {
                self.embeddings_running = false;
                let outcome = result.and_then(|message| {
                    self.ensure_chatbot()?;
                    Ok(message)
                });
                let notice = match outcome {
                    Ok(message) => Notice::Success(message),
                    Err(e) => {
                        warn!(error = %e, "Embedding run failed");
                        Notice::Error(e.user_message())
                    }
                };
                self.embeddings_notice = Some(notice);
            }
            UiEvent::PreviewReady { upload, lines } => {
                if upload != self.upload_seq {
                    return;
                }
                if let Some(file) = self.uploaded.as_mut() {
                    file.preview = lines;
                }
            }
            UiEvent::ResponseToken(delta) => {
                if self.is_responding {
                    self.current_response.push_str(&delta);
                }
            }
            UiEvent::ResponseFinished(result) => {
                let answer = match result {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(error = %e, "Chat request failed");
                        format!("⚠️ An error occurred while processing your request: {}", e)
                    }
                };
                self.session.push_assistant(answer);
                self.is_responding = false;
                self.current_response.clear();
                self.scroll_offset = 0;
            }
        }
    }

    fn ensure_chatbot(&mut self) -> Result<()> {
        if !self.session.has_chatbot() {
            let chatbot = (self.services.chatbot_factory)()?;
            self.session.attach_chatbot(Arc::new(chatbot));
            info!("Chatbot ready");
        }
        Ok(())
    }

    pub fn clear_chat(&mut self) {
        if self.is_responding {
            self.set_status("Wait for the current answer before clearing the chat");
            return;
        }
        self.session.clear_messages();
        self.scroll_offset = 0;
        self.set_status("Chat cleared");
    }

    /// Scroll chat view up, no further than the first rendered row
    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self
            .scroll_offset
            .saturating_add(amount)
            .min(self.chat_max_scroll.get());
    }

    /// Scroll chat view down
    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }
}

fn build_preview(bytes: &[u8]) -> Vec<String> {
    match extract_text(bytes) {
        Ok(text) if !text.trim().is_empty() => preview_lines(&text, PREVIEW_LINES),
        Ok(_) => vec!["(no extractable text)".to_string()],
        Err(e) => vec![format!("(preview unavailable: {})", e)],
    }
}
