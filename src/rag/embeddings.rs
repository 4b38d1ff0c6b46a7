use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::Config;
use crate::constants::EMBEDDINGS_SUCCESS_MESSAGE;
use crate::document::{load_pdf, RecursiveSplitter};
use crate::models::{normalize, Embedder, EmbedderFactory};
use crate::utils::{DocChatError, Result};
use crate::vectorstore::{QdrantStore, VectorPoint, VectorStore, CONTENT_KEY, METADATA_KEY};

/// Ingestion knobs taken from the config
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub normalize: bool,
    pub batch_size: usize,
    pub recreate_collection: bool,
    pub max_file_size: u64,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.ingest.chunk_size,
            chunk_overlap: config.ingest.chunk_overlap,
            normalize: config.embeddings.normalize,
            batch_size: config.embeddings.batch_size,
            recreate_collection: config.qdrant.recreate_collection,
            max_file_size: config.ingest.max_file_size,
        }
    }
}

/// Turns a PDF into embedded chunks stored in the vector store
pub struct EmbeddingsManager {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    splitter: RecursiveSplitter,
    settings: IngestSettings,
}

impl EmbeddingsManager {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: IngestSettings,
    ) -> Result<Self> {
        let splitter = RecursiveSplitter::new(settings.chunk_size, settings.chunk_overlap)?;
        Ok(Self {
            embedder,
            store,
            splitter,
            settings,
        })
    }

    /// Build from config: configured embedder plus the Qdrant collection
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = EmbedderFactory::create(&config.embeddings, &config.ollama)?;
        let store = Arc::new(QdrantStore::from_config(&config.qdrant)?);
        Self::new(embedder, store, IngestSettings::from_config(config))
    }

    /// Load, split, embed and store a PDF. Returns the success message.
    pub async fn create_embeddings(&self, pdf_path: &Path) -> Result<String> {
        if !pdf_path.exists() {
            return Err(DocChatError::FileNotFound(format!(
                "The file {} does not exist.",
                pdf_path.display()
            )));
        }

        let path = pdf_path.to_path_buf();
        let max_file_size = self.settings.max_file_size;
        let document = tokio::task::spawn_blocking(move || load_pdf(&path, max_file_size))
            .await
            .map_err(|e| DocChatError::InvalidDocument(format!("PDF extraction aborted: {}", e)))??;

        if document.text.trim().is_empty() {
            return Err(DocChatError::InvalidDocument(
                "No documents were loaded from the PDF.".to_string(),
            ));
        }

        info!(
            source = %document.source.display(),
            bytes = document.size_bytes,
            "Loaded PDF"
        );

        let source = document.source.display().to_string();
        let stored = self
            .index_text(&source, &document.digest, &document.text)
            .await?;
        info!(chunks = stored, source = %source, "Stored document chunks");

        Ok(EMBEDDINGS_SUCCESS_MESSAGE.to_string())
    }

    /// Split, embed and upsert already-extracted text. Returns the chunk count.
    pub async fn index_text(&self, source: &str, digest: &str, text: &str) -> Result<usize> {
        let chunks = self.splitter.split_text(text);
        if chunks.is_empty() {
            return Err(DocChatError::InvalidDocument(
                "No text chunks were created from the documents.".to_string(),
            ));
        }
        debug!(count = chunks.len(), "Split document into chunks");

        let mut collection_ready = false;
        let mut index = 0usize;

        for batch in chunks.chunks(self.settings.batch_size.max(1)) {
            let mut vectors = self.embedder.embed(batch).await?;
            if self.settings.normalize {
                vectors.iter_mut().for_each(|v| normalize(v));
            }

            if !collection_ready {
                let dimension = vectors.first().map(Vec::len).unwrap_or(0);
                if dimension == 0 {
                    return Err(DocChatError::Model(format!(
                        "Embedding model '{}' returned empty vectors",
                        self.embedder.model_name()
                    )));
                }
                self.store
                    .ensure_collection(dimension, self.settings.recreate_collection)
                    .await?;
                collection_ready = true;
            }

            let points = batch
                .iter()
                .zip(vectors)
                .map(|(content, vector)| {
                    let point = VectorPoint {
                        id: point_id(digest, index),
                        vector,
                        payload: json!({
                            CONTENT_KEY: content,
                            METADATA_KEY: {
                                "source": source,
                                "chunk_index": index,
                                "document_digest": digest,
                            },
                        }),
                    };
                    index += 1;
                    point
                })
                .collect();

            self.store.upsert(points).await?;
        }

        Ok(index)
    }
}

/// Deterministic point id for chunk `index` of the document with `digest`
pub fn point_id(digest: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(digest.as_bytes());
    hasher.update(b":");
    hasher.update(index.to_le_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    Uuid::from_bytes(bytes).to_string()
}
