/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_OLLAMA_HOST: &str = "localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_TEI_URL: &str = "http://localhost:8080";
pub const DEFAULT_COLLECTION_NAME: &str = "vector_db";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 600; // 10 minutes for large model requests
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 3;

// Models
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge-m3";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_K: usize = 1;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

// Document ingestion
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 250;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024; // 50MB
pub const UPLOAD_FILE_NAME: &str = "doc.pdf";
pub const PREVIEW_LINES: usize = 12;

// UI Configuration
pub const UI_REFRESH_INTERVAL_MS: u64 = 50;
pub const UI_SCROLL_LINES: u16 = 3;
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// User-facing messages
pub const EMBEDDINGS_SUCCESS_MESSAGE: &str = "✅ Vector DB Successfully Created and Stored in Qdrant!";
pub const UPLOAD_FIRST_WARNING: &str = "⚠️ Please upload a PDF first.";
pub const CHAT_LOCKED_INFO: &str = "🤖 Please upload a PDF and create embeddings to start chatting.";
pub const FOOTER_TEXT: &str = "...Document ChatBot by Cartel. 🛡️";
pub const DEFAULT_CONTACT_EMAIL: &str = "developer@example.com";
