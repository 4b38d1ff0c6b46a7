use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::traits::Embedder;
use crate::app::{EmbeddingProvider, EmbeddingsConfig, OllamaConfig};
use crate::constants::HTTP_REQUEST_TIMEOUT_SECS;
use crate::utils::{DocChatError, Result};

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| DocChatError::Config(format!("Failed to build HTTP client: {}", e)))
}

fn unreachable(service: &str, url: &str, err: reqwest::Error) -> DocChatError {
    warn!(service, url, "Embedding server request failed");
    DocChatError::Connection(format!("Failed to reach embedding server: {}", err))
}

fn check_count(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(DocChatError::Model(format!(
            "Embedding server returned {} vectors for {} inputs",
            got, expected
        )));
    }
    Ok(())
}

/// Embeddings from Ollama's `/api/embed`
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model_name: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    error: Option<String>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model_name, "input": texts }))
            .send()
            .await
            .map_err(|e| unreachable("Ollama", &self.base_url, e))?;

        let status = response.status();
        let body: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| DocChatError::from_transport("Ollama", e))?;

        if let Some(error) = body.error {
            return Err(DocChatError::Model(format!("Ollama embedding failed: {}", error)));
        }
        if !status.is_success() {
            return Err(DocChatError::Model(format!("Ollama embedding failed with {}", status)));
        }

        check_count(texts.len(), body.embeddings.len())?;
        Ok(body.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Embeddings from a HuggingFace text-embeddings-inference server
pub struct TeiEmbedder {
    client: Client,
    base_url: String,
    model_name: String,
    normalize: bool,
}

impl TeiEmbedder {
    pub fn new(base_url: &str, model_name: &str, normalize: bool) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
            normalize,
        })
    }
}

#[async_trait]
impl Embedder for TeiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embed", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "inputs": texts, "normalize": self.normalize }))
            .send()
            .await
            .map_err(|e| unreachable("TEI", &self.base_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocChatError::Model(format!(
                "TEI embedding failed with {}: {}",
                status, text
            )));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| DocChatError::from_transport("TEI", e))?;
        check_count(texts.len(), vectors.len())?;
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Scale a vector to unit length; zero vectors are left untouched
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Factory for the configured embedding backend
pub struct EmbedderFactory;

impl EmbedderFactory {
    pub fn create(config: &EmbeddingsConfig, ollama: &OllamaConfig) -> Result<Arc<dyn Embedder>> {
        let embedder: Arc<dyn Embedder> = match config.provider {
            EmbeddingProvider::Ollama => {
                Arc::new(OllamaEmbedder::new(&ollama.base_url(), &config.model)?)
            }
            EmbeddingProvider::Tei => Arc::new(TeiEmbedder::new(
                &config.tei_url,
                &config.model,
                config.normalize,
            )?),
        };
        Ok(embedder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_ollama_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(json!({ "model": "bge-m3", "input": ["a", "b"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "bge-m3",
                "embeddings": [[0.1, 0.2], [0.3, 0.4]]
            })))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "bge-m3").unwrap();
        let vectors = embedder
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_ollama_embed_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "model not found" })),
            )
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "missing").unwrap();
        let err = embedder.embed(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, DocChatError::Model(msg) if msg.contains("model not found")));
    }

    #[tokio::test]
    async fn test_tei_embed_sends_normalize_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_partial_json(json!({ "inputs": ["hello"], "normalize": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0, 0.0]])))
            .mount(&server)
            .await;

        let embedder = TeiEmbedder::new(&server.uri(), "BAAI/bge-small-en", true).unwrap();
        let vectors = embedder.embed(&["hello".to_string()]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0]])))
            .mount(&server)
            .await;

        let embedder = TeiEmbedder::new(&server.uri(), "bge", false).unwrap();
        let err = embedder
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DocChatError::Model(_)));
    }

    #[tokio::test]
    async fn test_unreachable_embedder_is_connection_error() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", "bge-m3").unwrap();
        let err = embedder.embed(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(
            &err,
            DocChatError::Connection(msg) if msg.starts_with("Failed to reach embedding server: ")
        ));
        assert_eq!(err.user_message(), err.to_string());
    }

    #[test]
    fn test_factory_picks_provider() {
        let mut config = EmbeddingsConfig::default();
        let ollama = OllamaConfig::default();
        assert_eq!(
            EmbedderFactory::create(&config, &ollama).unwrap().model_name(),
            "bge-m3"
        );

        config.provider = EmbeddingProvider::Tei;
        config.model = "BAAI/bge-small-en".to_string();
        assert_eq!(
            EmbedderFactory::create(&config, &ollama).unwrap().model_name(),
            "BAAI/bge-small-en"
        );
    }
}
