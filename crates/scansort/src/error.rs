//! Error types for the classification service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// OCR text extraction failed
    #[error("Text extraction failed for '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Image-to-PDF conversion failed
    #[error("PDF conversion failed for '{filename}': {message}")]
    Conversion { filename: String, message: String },

    /// Job not found in the registry
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// File not found in any managed directory
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Missing or invalid API key
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a conversion error
    pub fn conversion(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::Extraction { filename, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "extraction_error",
                format!("Text extraction failed for '{}': {}", filename, message),
            ),
            Error::Conversion { filename, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "conversion_error",
                format!("PDF conversion failed for '{}': {}", filename, message),
            ),
            Error::JobNotFound(name) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Job not found: {}", name),
            ),
            Error::FileNotFound(name) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("File not found: {}", name),
            ),
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or missing API key".to_string(),
            ),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
