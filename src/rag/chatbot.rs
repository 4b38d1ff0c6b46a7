use std::sync::Arc;
use tracing::debug;

use super::prompt::{build_prompt, join_context};
use crate::app::Config;
use crate::models::{
    normalize, ChatMessage, Embedder, EmbedderFactory, GenerationOptions, LanguageModel,
    ModelFactory, StreamCallback,
};
use crate::utils::{DocChatError, Result};
use crate::vectorstore::{QdrantStore, ScoredPoint, VectorStore};

/// Answers questions from the chunks stored in the vector store
pub struct ChatbotManager {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    options: GenerationOptions,
    top_k: usize,
    normalize: bool,
}

impl ChatbotManager {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        options: GenerationOptions,
        top_k: usize,
        normalize: bool,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            options,
            top_k: top_k.max(1),
            normalize,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = EmbedderFactory::create(&config.embeddings, &config.ollama)?;
        let store = Arc::new(QdrantStore::from_config(&config.qdrant)?);
        let llm = ModelFactory::create(config)?;
        let options = GenerationOptions {
            temperature: Some(config.llm.temperature),
            ..GenerationOptions::default()
        };

        Ok(Self::new(
            embedder,
            store,
            llm,
            options,
            config.llm.top_k,
            config.embeddings.normalize,
        ))
    }

    pub fn model_name(&self) -> &str {
        self.llm.name()
    }

    /// Nearest chunks for a question
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredPoint>> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let mut vector = vectors.pop().ok_or_else(|| {
            DocChatError::Model(format!(
                "Embedding model '{}' returned no vector for the question",
                self.embedder.model_name()
            ))
        })?;
        if self.normalize {
            normalize(&mut vector);
        }

        let hits = self.store.search(vector, self.top_k).await?;
        debug!(hits = hits.len(), top_k = self.top_k, "Retrieved context");
        Ok(hits)
    }

    /// Answer a question in one go
    pub async fn get_response(&self, query: &str) -> Result<String> {
        self.stream_response(query, None).await
    }

    /// Answer a question, passing token deltas to `callback` as they arrive.
    /// Returns the full answer.
    pub async fn stream_response(
        &self,
        query: &str,
        callback: Option<StreamCallback>,
    ) -> Result<String> {
        let hits = self.retrieve(query).await?;
        let prompt = build_prompt(&join_context(&hits), query);

        let response = self
            .llm
            .chat(&[ChatMessage::user(prompt)], &self.options, callback)
            .await?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Generation finished"
            );
        }

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageRole, MockEmbedder, MockLanguageModel, ModelResponse};
    use crate::vectorstore::MockVectorStore;
    use serde_json::json;
    use std::sync::Mutex;

    fn embedder() -> MockEmbedder {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .withf(|texts| texts.len() == 1)
            .returning(|_| Ok(vec![vec![0.0, 2.0]]));
        embedder.expect_model_name().return_const("bge-m3".to_string());
        embedder
    }

    fn store_with(text: &'static str) -> MockVectorStore {
        let mut store = MockVectorStore::new();
        store
            .expect_search()
            .withf(|vector, limit| vector == &vec![0.0, 1.0] && *limit == 1)
            .returning(move |_, _| {
                Ok(vec![ScoredPoint {
                    id: "p".to_string(),
                    score: 0.9,
                    payload: json!({ "page_content": text }),
                }])
            });
        store
    }

    #[tokio::test]
    async fn test_get_response_builds_prompt_from_context() {
        let mut llm = MockLanguageModel::new();
        llm.expect_chat()
            .withf(|messages, options, callback| {
                messages.len() == 1
                    && messages[0].role == MessageRole::User
                    && messages[0].content.contains("Context: The sky is blue.")
                    && messages[0].content.contains("Question: What colour is the sky?")
                    && options.temperature == Some(0.2)
                    && callback.is_none()
            })
            .returning(|_, _, _| {
                Ok(ModelResponse {
                    content: "Blue.".to_string(),
                    usage: None,
                    model_name: "llama3.2:3b".to_string(),
                })
            });

        let manager = ChatbotManager::new(
            Arc::new(embedder()),
            Arc::new(store_with("The sky is blue.")),
            Arc::new(llm),
            GenerationOptions {
                temperature: Some(0.2),
                ..GenerationOptions::default()
            },
            1,
            true,
        );

        let answer = manager.get_response("What colour is the sky?").await.unwrap();
        assert_eq!(answer, "Blue.");
    }

    #[tokio::test]
    async fn test_stream_response_forwards_callback() {
        let mut llm = MockLanguageModel::new();
        llm.expect_chat().returning(|_, _, callback| {
            if let Some(cb) = callback {
                cb("Bl");
                cb("ue.");
            }
            Ok(ModelResponse {
                content: "Blue.".to_string(),
                usage: None,
                model_name: "m".to_string(),
            })
        });

        let manager = ChatbotManager::new(
            Arc::new(embedder()),
            Arc::new(store_with("ctx")),
            Arc::new(llm),
            GenerationOptions::default(),
            1,
            true,
        );

        let received = Arc::new(Mutex::new(String::new()));
        let sink = received.clone();
        let callback: StreamCallback = Arc::new(move |delta: &str| {
            sink.lock().unwrap().push_str(delta);
        });

        let answer = manager.stream_response("q", Some(callback)).await.unwrap();
        assert_eq!(answer, "Blue.");
        assert_eq!(*received.lock().unwrap(), "Blue.");
    }

    #[tokio::test]
    async fn test_search_failure_skips_llm() {
        let mut store = MockVectorStore::new();
        store.expect_search().returning(|_, _| {
            Err(DocChatError::Connection(
                "Failed to connect to Qdrant: refused".to_string(),
            ))
        });
        let mut llm = MockLanguageModel::new();
        llm.expect_chat().never();

        let manager = ChatbotManager::new(
            Arc::new(embedder()),
            Arc::new(store),
            Arc::new(llm),
            GenerationOptions::default(),
            1,
            true,
        );

        let err = manager.get_response("q").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to connect to Qdrant: refused");
    }

    #[tokio::test]
    async fn test_empty_embedding_is_model_error() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(Vec::new()));
        embedder.expect_model_name().return_const("bge-m3".to_string());

        let manager = ChatbotManager::new(
            Arc::new(embedder),
            Arc::new(MockVectorStore::new()),
            Arc::new(MockLanguageModel::new()),
            GenerationOptions::default(),
            1,
            false,
        );

        let err = manager.retrieve("q").await.unwrap_err();
        assert!(matches!(err, DocChatError::Model(_)));
    }
}
