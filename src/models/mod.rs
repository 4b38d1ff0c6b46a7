// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod embeddings;
mod factory;
mod ollama;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use embeddings::{normalize, EmbedderFactory, OllamaEmbedder, TeiEmbedder};
pub use factory::{strip_provider, ModelFactory};
pub use ollama::OllamaModel;
pub use traits::{Embedder, LanguageModel};
#[cfg(test)]
pub use traits::{MockEmbedder, MockLanguageModel};
pub use types::{
    ChatMessage, GenerationOptions, MessageRole, ModelResponse, StreamCallback, TokenUsage,
};
