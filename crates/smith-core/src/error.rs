//! Unified error types for smith

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all smith operations
#[derive(Error, Debug)]
pub enum SmithError {
    // Precondition errors
    #[error("Task document not found or empty: {}", .0.display())]
    MissingTaskDocument(PathBuf),

    #[error(
        "No API credentials found. Set either:\n\
         - OPENROUTER_API_KEY=... (OpenRouter)\n\
         - OPENAI_API_KEY=...     (OpenAI)"
    )]
    MissingCredentials,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // File writing errors
    #[error("Path validation failed: {0}")]
    PathValidation(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SmithError {
    /// Whether this error is one of the implementer's hard preconditions
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SmithError::MissingTaskDocument(_) | SmithError::MissingCredentials
        )
    }
}

/// Result type alias using SmithError
pub type Result<T> = std::result::Result<T, SmithError>;
