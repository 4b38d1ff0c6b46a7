pub mod app;
pub mod cli;
pub mod constants;
pub mod document;
pub mod models;
pub mod ollama;
pub mod rag;
pub mod runtime;
pub mod session;
pub mod tui;
pub mod utils;
pub mod vectorstore;

pub use app::{load_config, Config};
pub use rag::{ChatbotManager, EmbeddingsManager};
pub use session::SessionState;
pub use tui::run_ui;
pub use utils::DocChatError;
