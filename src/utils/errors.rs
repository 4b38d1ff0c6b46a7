use thiserror::Error;

/// Main error type for docchat
#[derive(Error, Debug)]
pub enum DocChatError {
    /// The document path does not point at a file
    #[error("{0}")]
    FileNotFound(String),

    /// The document could not be turned into usable chunks
    #[error("{0}")]
    InvalidDocument(String),

    /// A backing service (Qdrant, Ollama, TEI) could not be reached
    #[error("{0}")]
    Connection(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocChatError {
    /// Message shown to the user for a failed embedding run.
    ///
    /// File, document and connection problems carry a message meant for the
    /// user as-is; anything else is reported as unexpected.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound(msg) | Self::InvalidDocument(msg) | Self::Connection(msg) => {
                msg.clone()
            }
            other => format!("An unexpected error occurred: {}", other),
        }
    }

    /// Classify a reqwest failure against a named service
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Model(format!("Unexpected response from {}: {}", service, err))
        } else {
            Self::Connection(format!("Failed to connect to {}: {}", service, err))
        }
    }
}

pub type Result<T> = std::result::Result<T, DocChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors_keep_their_message() {
        let err = DocChatError::FileNotFound("The file doc.pdf does not exist.".to_string());
        assert_eq!(err.user_message(), "The file doc.pdf does not exist.");

        let err = DocChatError::InvalidDocument("No documents were loaded from the PDF.".to_string());
        assert_eq!(err.user_message(), "No documents were loaded from the PDF.");

        let err = DocChatError::Connection("Failed to connect to Qdrant: refused".to_string());
        assert_eq!(err.user_message(), "Failed to connect to Qdrant: refused");
    }

    #[test]
    fn test_other_errors_are_reported_as_unexpected() {
        let err = DocChatError::Model("bad status".to_string());
        assert_eq!(
            err.user_message(),
            "An unexpected error occurred: Model error: bad status"
        );
    }
}
