use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::utils::{DocChatError, Result};

/// A PDF read from disk with its extracted text
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Where the bytes were read from
    pub source: PathBuf,
    /// Extracted plain text
    pub text: String,
    /// Size of the file in bytes
    pub size_bytes: u64,
    /// Hex SHA-256 of the file contents
    pub digest: String,
}

/// Whether the path has a `.pdf` extension (any case)
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Read a PDF and extract its text
pub fn load_pdf(path: &Path, max_file_size: u64) -> Result<LoadedDocument> {
    if !path.is_file() {
        return Err(DocChatError::FileNotFound(format!(
            "The file {} does not exist.",
            path.display()
        )));
    }

    let size_bytes = std::fs::metadata(path)?.len();
    if size_bytes > max_file_size {
        return Err(DocChatError::InvalidDocument(format!(
            "File too large: {} bytes (max {} bytes)",
            size_bytes, max_file_size
        )));
    }

    let bytes = std::fs::read(path)?;
    let text = extract_text(&bytes)?;

    Ok(LoadedDocument {
        source: path.to_path_buf(),
        text,
        size_bytes,
        digest: digest(&bytes),
    })
}

/// Extract plain text from in-memory PDF bytes
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs
    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(DocChatError::InvalidDocument(format!(
            "Failed to read PDF: {}",
            e
        ))),
        Err(_) => Err(DocChatError::InvalidDocument(
            "Failed to read PDF: the document is malformed".to_string(),
        )),
    }
}

/// Hex SHA-256 of a byte slice
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// First `n` non-empty lines of `text`, trimmed
pub fn preview_lines(text: &str, n: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(n)
        .map(str::to_string)
        .collect()
}
