use std::sync::Arc;

use super::ollama::OllamaModel;
use super::traits::LanguageModel;
use crate::app::Config;
use crate::utils::Result;

/// Factory for creating chat model instances
pub struct ModelFactory;

impl ModelFactory {
    /// Create the configured chat model.
    /// Accepts either a bare Ollama tag ("llama3.2:3b") or "ollama/llama3.2:3b".
    pub fn create(config: &Config) -> Result<Arc<dyn LanguageModel>> {
        let model_name = strip_provider(&config.llm.model);
        let model = OllamaModel::new(&config.ollama.base_url(), model_name)?;
        Ok(Arc::new(model))
    }
}

/// Drop an optional "ollama/" prefix
pub fn strip_provider(model_id: &str) -> &str {
    model_id.strip_prefix("ollama/").unwrap_or(model_id)
}
