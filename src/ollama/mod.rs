/// Ollama integration module - Gateway
mod detector;
mod guide;
mod installer;

pub use detector::{has_model, is_installed, list_models};
pub use guide::{detect_and_guide, qdrant_guide};
pub use installer::{ensure_model, ensure_models, install_model};
