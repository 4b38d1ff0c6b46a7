//! Qdrant REST client
//!
//! Talks to Qdrant's HTTP API (port 6333) directly with reqwest.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{ScoredPoint, VectorPoint, VectorStore};
use crate::app::QdrantConfig;
use crate::constants::{HEALTH_CHECK_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS};
use crate::utils::{DocChatError, Result};

/// Collection handle on a Qdrant server
#[derive(Clone)]
pub struct QdrantStore {
    http: Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

impl QdrantStore {
    pub fn new(base_url: &str, collection: &str, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| DocChatError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &QdrantConfig) -> Result<Self> {
        Self::new(&config.url, &config.collection, config.api_key.clone())
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        request
            .send()
            .await
            .map_err(|e| DocChatError::Connection(format!("Failed to connect to Qdrant: {}", e)))
    }

    async fn expect_success(&self, response: reqwest::Response, action: &str) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DocChatError::Model(format!(
                "Qdrant {} failed ({}): {}",
                action, status, text
            )));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Vector size of the collection, or None when it does not exist
    pub async fn collection_vector_size(&self) -> Result<Option<usize>> {
        let path = format!("/collections/{}", self.collection);
        let response = self.send(self.request(Method::GET, &path)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = self.expect_success(response, "collection lookup").await?;
        let size = body
            .pointer("/result/config/params/vectors/size")
            .and_then(Value::as_u64)
            .map(|s| s as usize);
        Ok(Some(size.unwrap_or(0)))
    }

    async fn create_collection(&self, dimension: usize) -> Result<()> {
        info!(collection = %self.collection, dimension, "Creating Qdrant collection");
        let path = format!("/collections/{}", self.collection);
        let request = self
            .request(Method::PUT, &path)
            .json(&json!({ "vectors": { "size": dimension, "distance": "Cosine" } }));
        let response = self.send(request).await?;
        self.expect_success(response, "collection create").await?;
        Ok(())
    }

    async fn delete_collection(&self) -> Result<()> {
        info!(collection = %self.collection, "Dropping Qdrant collection");
        let path = format!("/collections/{}", self.collection);
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.expect_success(response, "collection delete").await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dimension: usize, recreate: bool) -> Result<()> {
        if recreate {
            self.delete_collection().await?;
        }

        match self.collection_vector_size().await? {
            None => self.create_collection(dimension).await,
            Some(existing) if existing == dimension || existing == 0 => Ok(()),
            Some(existing) => Err(DocChatError::InvalidDocument(format!(
                "Collection '{}' stores {}-dimensional vectors but the embedding model produces {}. \
                 Use another collection or set qdrant.recreate_collection = true.",
                self.collection, existing, dimension
            ))),
        }
    }

    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        debug!(collection = %self.collection, count = points.len(), "Upserting points");
        let path = format!("/collections/{}/points?wait=true", self.collection);
        let request = self
            .request(Method::PUT, &path)
            .json(&json!({ "points": points }));
        let response = self.send(request).await?;
        self.expect_success(response, "upsert").await?;
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPoint>> {
        let path = format!("/collections/{}/points/search", self.collection);
        let request = self.request(Method::POST, &path).json(&json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        }));
        let response = self.send(request).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocChatError::InvalidDocument(format!(
                "Collection '{}' does not exist yet. Upload a PDF and create embeddings first.",
                self.collection
            )));
        }

        let body = self.expect_success(response, "search").await?;
        let parsed: SearchResponse = serde_json::from_value(body)?;

        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                id: match hit.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                score: hit.score,
                payload: hit.payload.unwrap_or(Value::Null),
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        let request = self
            .request(Method::GET, "/healthz")
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS));
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn collection_info(size: usize) -> Value {
        json!({
            "result": { "config": { "params": { "vectors": { "size": size, "distance": "Cosine" } } } },
            "status": "ok"
        })
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/vector_db"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/vector_db"))
            .and(body_partial_json(json!({ "vectors": { "size": 3, "distance": "Cosine" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "vector_db", None).unwrap();
        store.ensure_collection(3, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_collection_keeps_matching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/vector_db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection_info(3)))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/vector_db"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "vector_db", None).unwrap();
        store.ensure_collection(3, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_recreate_drops_then_creates() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/collections/vector_db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/vector_db"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/vector_db"))
            .and(body_partial_json(json!({ "vectors": { "size": 3 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "vector_db", None).unwrap();
        store.ensure_collection(3, true).await.unwrap();

        let methods: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.method.to_string())
            .collect();
        assert_eq!(methods, vec!["DELETE", "GET", "PUT"]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_invalid_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/vector_db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection_info(384)))
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "vector_db", None).unwrap();
        let err = store.ensure_collection(1024, false).await.unwrap_err();
        assert!(matches!(err, DocChatError::InvalidDocument(msg) if msg.contains("384")));
    }

    #[tokio::test]
    async fn test_upsert_sends_points_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/docs/points"))
            .and(query_param("wait", "true"))
            .and(header("api-key", "secret"))
            .and(body_partial_json(json!({
                "points": [{ "id": "p1", "vector": [1.0, 0.0], "payload": { "page_content": "hello" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "docs", Some("secret".to_string())).unwrap();
        store
            .upsert(vec![VectorPoint {
                id: "p1".to_string(),
                vector: vec![1.0, 0.0],
                payload: json!({ "page_content": "hello" }),
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_search_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/vector_db/points/search"))
            .and(body_partial_json(json!({ "limit": 2, "with_payload": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    { "id": "a", "score": 0.9, "payload": { "page_content": "first" } },
                    { "id": 7, "score": 0.5, "payload": { "page_content": "second" } }
                ],
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "vector_db", None).unwrap();
        let hits = store.search(vec![0.1, 0.2], 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].content(), Some("first"));
        assert_eq!(hits[1].id, "7");
    }

    #[tokio::test]
    async fn test_search_missing_collection_is_invalid_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/vector_db/points/search"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": { "error": "Not found: Collection `vector_db` doesn't exist!" }
            })))
            .mount(&server)
            .await;

        let store = QdrantStore::new(&server.uri(), "vector_db", None).unwrap();
        let err = store.search(vec![0.1, 0.2], 2).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Collection 'vector_db' does not exist yet. Upload a PDF and create embeddings first."
        );
    }

    #[tokio::test]
    async fn test_unreachable_qdrant_is_connection_error() {
        let store = QdrantStore::new("http://127.0.0.1:9", "vector_db", None).unwrap();
        let err = store.ensure_collection(3, false).await.unwrap_err();
        match err {
            DocChatError::Connection(msg) => assert!(msg.starts_with("Failed to connect to Qdrant")),
            other => panic!("expected Connection, got {:?}", other),
        }
        assert!(!store.health_check().await);
    }
}
