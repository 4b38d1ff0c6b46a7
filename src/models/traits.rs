use async_trait::async_trait;

use super::types::{ChatMessage, GenerationOptions, ModelResponse, StreamCallback};
use crate::utils::Result;

/// Core trait that all chat model backends must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a conversation to the model and get a response.
    ///
    /// When `stream_callback` is set, content deltas are passed to it as they
    /// arrive; the returned response still carries the full text.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        stream_callback: Option<StreamCallback>,
    ) -> Result<ModelResponse>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Turns text into dense vectors
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts; one vector per input, in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Model identifier for logs and status output
    fn model_name(&self) -> &str;
}
