//! Error types for study-kit generation.
//!
//! Only [`Error::EmptyInput`] ever escapes [`crate::KitGenerator::generate`];
//! every other variant is produced by an internal stage and absorbed by that
//! stage's fallback path.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a study kit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither text nor pages were supplied
    #[error("No content provided")]
    EmptyInput,

    /// Image is unusable for preprocessing (zero or tiny dimensions)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Recognition engine reported a failure
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Recognition engine is not installed or could not be loaded
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Embedding model failed while computing vectors
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Model could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// A deadline expired
    #[error("Deadline exceeded during {0}")]
    Timeout(&'static str),

    /// Out-of-process service returned an error
    #[error("{service} error: {message}")]
    Upstream {
        /// Name of the service
        service: String,
        /// Message reported by the service
        message: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_message() {
        assert_eq!(Error::EmptyInput.to_string(), "No content provided");
    }

    #[test]
    fn test_upstream_is_labeled() {
        let err = Error::Upstream {
            service: "OCR service".to_string(),
            message: "page limit exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "OCR service error: page limit exceeded");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
