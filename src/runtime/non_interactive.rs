use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

use crate::{
    app::Config,
    cli::OutputFormat,
    rag::{ChatbotManager, EmbeddingsManager},
    utils::DocChatError,
};

/// Result of `docchat ask`
#[derive(Debug, Serialize, Deserialize)]
pub struct NonInteractiveResult {
    /// The question that was asked
    pub question: String,
    /// The model's answer (empty on failure)
    pub answer: String,
    /// Any errors that occurred
    pub errors: Vec<String>,
    pub metadata: ExecutionMetadata,
}

/// Result of `docchat ingest`
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResult {
    pub source: String,
    pub success: bool,
    /// Success message or the user-facing error
    pub message: String,
    pub duration_ms: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Chat model used
    pub model: String,
    pub embedding_model: String,
    pub collection: String,
    /// Execution time in milliseconds
    pub duration_ms: u128,
    pub finished_at: DateTime<Utc>,
}

/// Runs ingest and ask without the TUI
pub struct NonInteractiveRunner {
    config: Config,
}

impl NonInteractiveRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Upload a PDF and create its embeddings
    pub async fn ingest(&self, pdf: &Path) -> IngestResult {
        let start_time = Instant::now();

        let outcome = match self.upload(pdf) {
            Ok(uploaded) => match EmbeddingsManager::from_config(&self.config) {
                Ok(manager) => manager.create_embeddings(&uploaded).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let (success, message) = match outcome {
            Ok(message) => (true, message),
            Err(e) => (false, e.user_message()),
        };

        IngestResult {
            source: pdf.display().to_string(),
            success,
            message,
            duration_ms: start_time.elapsed().as_millis(),
        }
    }

    /// Answer one question from the stored document
    pub async fn ask(&self, question: String) -> NonInteractiveResult {
        let start_time = Instant::now();
        let mut errors = Vec::new();

        let answer = match self.answer(&question).await {
            Ok(answer) => answer,
            Err(e) => {
                errors.push(format!(
                    "⚠️ An error occurred while processing your request: {}",
                    e
                ));
                String::new()
            }
        };

        NonInteractiveResult {
            question,
            answer,
            errors,
            metadata: ExecutionMetadata {
                model: self.config.llm.model.clone(),
                embedding_model: self.config.embeddings.model.clone(),
                collection: self.config.qdrant.collection.clone(),
                duration_ms: start_time.elapsed().as_millis(),
                finished_at: Utc::now(),
            },
        }
    }

    /// Copy the PDF to the configured upload path
    fn upload(&self, pdf: &Path) -> Result<PathBuf, DocChatError> {
        if !pdf.is_file() {
            return Err(DocChatError::FileNotFound(format!(
                "The file {} does not exist.",
                pdf.display()
            )));
        }

        let size_bytes = std::fs::metadata(pdf)?.len();
        if size_bytes > self.config.ingest.max_file_size {
            return Err(DocChatError::InvalidDocument(format!(
                "File too large: {} bytes (max {} bytes)",
                size_bytes, self.config.ingest.max_file_size
            )));
        }

        let destination = self
            .config
            .ingest
            .resolved_upload_path()
            .map_err(|e| DocChatError::Config(e.to_string()))?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(pdf, &destination)?;
        debug!(from = %pdf.display(), to = %destination.display(), "Uploaded document");

        Ok(destination)
    }

    async fn answer(&self, question: &str) -> Result<String, DocChatError> {
        let chatbot = ChatbotManager::from_config(&self.config)?;
        chatbot.get_response(question).await
    }
}

/// Format an answer according to the output format
pub fn format_result(result: &NonInteractiveResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)),
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(&result.answer);

            if !result.errors.is_empty() {
                if !output.is_empty() {
                    output.push_str("\n\n");
                }
                output.push_str("--- Errors ---\n");
                for error in &result.errors {
                    output.push_str(&format!("• {}\n", error));
                }
            }

            output
        }
        OutputFormat::Markdown => {
            let mut output = String::new();

            output.push_str("## Question\n\n");
            output.push_str(&result.question);
            output.push_str("\n\n## Answer\n\n");
            output.push_str(&result.answer);
            output.push_str("\n\n");

            if !result.errors.is_empty() {
                output.push_str("## Errors\n\n");
                for error in &result.errors {
                    output.push_str(&format!("- {}\n", error));
                }
                output.push('\n');
            }

            output.push_str("---\n");
            output.push_str(&format!(
                "*Model: {} | Embeddings: {} | Collection: {} | Duration: {}ms*\n",
                result.metadata.model,
                result.metadata.embedding_model,
                result.metadata.collection,
                result.metadata.duration_ms
            ));

            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(errors: Vec<String>) -> NonInteractiveResult {
        NonInteractiveResult {
            question: "What is Qdrant?".to_string(),
            answer: if errors.is_empty() {
                "A vector database.".to_string()
            } else {
                String::new()
            },
            errors,
            metadata: ExecutionMetadata {
                model: "llama3.2:3b".to_string(),
                embedding_model: "bge-m3".to_string(),
                collection: "vector_db".to_string(),
                duration_ms: 12,
                finished_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_text_format_is_just_the_answer() {
        assert_eq!(
            format_result(&sample(Vec::new()), OutputFormat::Text),
            "A vector database."
        );
    }

    #[test]
    fn test_text_format_lists_errors() {
        let text = format_result(&sample(vec!["boom".to_string()]), OutputFormat::Text);
        assert_eq!(text, "--- Errors ---\n• boom\n");
    }

    #[test]
    fn test_json_format_round_trips() {
        let json = format_result(&sample(Vec::new()), OutputFormat::Json);
        let parsed: NonInteractiveResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.answer, "A vector database.");
        assert_eq!(parsed.metadata.collection, "vector_db");
    }

    #[test]
    fn test_markdown_format_has_sections() {
        let md = format_result(&sample(Vec::new()), OutputFormat::Markdown);
        assert!(md.starts_with("## Question\n\nWhat is Qdrant?"));
        assert!(md.contains("## Answer\n\nA vector database."));
        assert!(md.contains("*Model: llama3.2:3b | Embeddings: bge-m3"));
    }

    #[tokio::test]
    async fn test_ingest_missing_file_reports_message() {
        let dir = TempDir::new().unwrap();
        let runner = NonInteractiveRunner::new(Config::default());
        let pdf = dir.path().join("missing.pdf");

        let result = runner.ingest(&pdf).await;
        assert!(!result.success);
        assert_eq!(
            result.message,
            format!("The file {} does not exist.", pdf.display())
        );
    }

    #[tokio::test]
    async fn test_ingest_rejects_oversized_file_before_copying() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("big.pdf");
        std::fs::write(&pdf, vec![0u8; 64]).unwrap();

        let mut config = Config::default();
        config.ingest.max_file_size = 16;
        config.ingest.upload_path = Some(dir.path().join("uploads").join("doc.pdf"));
        let runner = NonInteractiveRunner::new(config);

        let result = runner.ingest(&pdf).await;
        assert!(!result.success);
        assert!(result.message.contains("File too large: 64 bytes"));
        assert!(!dir.path().join("uploads").exists());
    }
}
