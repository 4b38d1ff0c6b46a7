// Gateway module for TUI - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod app;
mod markdown;
mod page;
mod render;
mod ui;

// Public re-exports - the ONLY way to access TUI functionality
pub use app::{App, AppServices, AppState, ChatbotFactory, Notice, UiEvent, UploadedFile};
pub use markdown::{parse_markdown, parse_markdown_with};
pub use page::{Page, Panel};
pub use ui::run_ui;
