//! Vector storage for document chunks

mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::Result;

pub use qdrant::QdrantStore;

/// Payload key holding the chunk text
pub const CONTENT_KEY: &str = "page_content";
/// Payload key holding chunk metadata
pub const METADATA_KEY: &str = "metadata";

/// A vector with its id and payload, ready for upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// A search hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    /// Cosine similarity
    pub score: f32,
    pub payload: Value,
}

impl ScoredPoint {
    /// Chunk text stored with the point
    pub fn content(&self) -> Option<&str> {
        self.payload.get(CONTENT_KEY).and_then(Value::as_str)
    }
}

/// Storage and similarity search over embedded chunks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Make sure the collection exists for vectors of `dimension`.
    /// With `recreate`, any existing collection is dropped first.
    async fn ensure_collection(&self, dimension: usize, recreate: bool) -> Result<()>;

    /// Insert or replace points by id
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()>;

    /// Nearest neighbours of `vector`, best first
    async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Returns true if the backend is operational
    async fn health_check(&self) -> bool;
}
