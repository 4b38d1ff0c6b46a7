// Gateway module for retrieval-augmented generation - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod chatbot;
mod embeddings;
mod prompt;

// Public re-exports - the ONLY way to access rag functionality
pub use chatbot::ChatbotManager;
pub use embeddings::{point_id, EmbeddingsManager, IngestSettings};
pub use prompt::{build_prompt, join_context, QA_PROMPT_TEMPLATE};
