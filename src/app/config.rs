use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION_NAME, DEFAULT_CONTACT_EMAIL,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_LLM_MODEL, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_PORT, DEFAULT_QDRANT_URL, DEFAULT_TEI_URL,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_K, UPLOAD_FILE_NAME,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Embedding model configuration
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Vector store configuration
    #[serde(default)]
    pub qdrant: QdrantConfig,

    /// Chat model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Ollama server
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Document ingestion
    #[serde(default)]
    pub ingest: IngestConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UIConfig,
}

/// Which server produces embeddings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Ollama `/api/embed`
    Ollama,
    /// HuggingFace text-embeddings-inference `/embed`
    Tei,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProvider,
    /// Model name as the provider knows it
    pub model: String,
    /// Base URL of the TEI server (provider = "tei")
    pub tei_url: String,
    /// Scale every vector to unit length
    pub normalize: bool,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Ollama,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            tei_url: DEFAULT_TEI_URL.to_string(),
            normalize: true,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QdrantConfig {
    /// REST endpoint
    pub url: String,
    pub collection: String,
    pub api_key: Option<String>,
    /// Drop and recreate the collection on every ingest
    pub recreate_collection: bool,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            api_key: None,
            recreate_collection: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Ollama model tag
    pub model: String,
    pub temperature: f32,
    /// Chunks retrieved per question
    pub top_k: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    /// Ollama server host
    pub host: String,
    /// Ollama server port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            port: DEFAULT_OLLAMA_PORT,
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    /// Where uploaded documents are copied (defaults to the data directory)
    pub upload_path: Option<PathBuf>,
    /// Largest PDF accepted, in bytes
    pub max_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            upload_path: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl IngestConfig {
    /// Resolve the upload destination
    pub fn resolved_upload_path(&self) -> Result<PathBuf> {
        match &self.upload_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_data_dir()?.join(UPLOAD_FILE_NAME)),
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    /// Address shown on the Contact page
    pub contact_email: String,
    /// Show navigation sidebar by default
    pub show_sidebar: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            show_sidebar: true,
        }
    }
}

impl Config {
    /// Models that have to be pulled into Ollama for this configuration
    pub fn ollama_models(&self) -> Vec<&str> {
        let mut models = vec![self.llm.model.as_str()];
        if self.embeddings.provider == EmbeddingProvider::Ollama {
            models.push(self.embeddings.model.as_str());
        }
        models
    }

    /// Reject settings the ingestion pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            anyhow::bail!("ingest.chunk_size must be greater than zero");
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            anyhow::bail!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap,
                self.ingest.chunk_size
            );
        }
        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than zero");
        }
        if self.llm.top_k == 0 {
            anyhow::bail!("llm.top_k must be greater than zero");
        }
        Ok(())
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(".docchat/config.toml");
    load_config_from(&[global_config, local_config])
}

/// Layer defaults, the given TOML files (when present) and `DOCCHAT_` env vars
pub fn load_config_from(files: &[PathBuf]) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }

    // DOCCHAT_QDRANT__URL -> qdrant.url
    figment = figment.merge(Env::prefixed("DOCCHAT_").split("__"));

    let config: Config = figment.extract().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Load a single explicit config file on top of the defaults
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    load_config_from(&[path.to_path_buf()])
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "docchat") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("docchat");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Get the data directory (uploads, logs)
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "docchat") {
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let data_dir = PathBuf::from(home).join(".local").join("share").join("docchat");
        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        let default_config = Config::default();
        save_config(&default_config, Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    }

    // Create example local config
    let local_example = PathBuf::from(".docchat/config.toml.example");
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let example_config = r#"# docchat Project Configuration
# This file overrides global settings for this directory

[llm]
model = "llama3.2:3b"
temperature = 0.7
top_k = 1

[embeddings]
provider = "ollama"
model = "bge-m3"

[qdrant]
url = "http://localhost:6333"
collection = "vector_db"

[ingest]
chunk_size = 1000
chunk_overlap = 250
"#;
        std::fs::write(&local_example, example_config)?;
        println!("Created example configuration at: {}", local_example.display());
    }

    Ok(())
}
