use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::rag::ChatbotManager;

/// Who authored a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the chat column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// State kept for the lifetime of one interactive session
#[derive(Default)]
pub struct SessionState {
    /// Local copy of the last uploaded PDF
    pub temp_pdf_path: Option<PathBuf>,
    /// Set after the first successful embedding run
    pub chatbot_manager: Option<Arc<ChatbotManager>>,
    pub messages: Vec<ChatTurn>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_document(&mut self, path: PathBuf) {
        self.temp_pdf_path = Some(path);
    }

    pub fn has_chatbot(&self) -> bool {
        self.chatbot_manager.is_some()
    }

    /// Store the chatbot unless one is already attached.
    /// Returns true when `manager` was stored.
    pub fn attach_chatbot(&mut self, manager: Arc<ChatbotManager>) -> bool {
        if self.chatbot_manager.is_some() {
            return false;
        }
        self.chatbot_manager = Some(manager);
        true
    }

    pub fn chatbot(&self) -> Option<Arc<ChatbotManager>> {
        self.chatbot_manager.clone()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatTurn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatTurn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("temp_pdf_path", &self.temp_pdf_path)
            .field("chatbot_manager", &self.chatbot_manager.is_some())
            .field("messages", &self.messages.len())
            .finish()
    }
}
