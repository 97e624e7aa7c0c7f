// src/error.rs
//! Error taxonomy shared by every component of the analysis pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Raised before any external call is made.
    #[error("Text is empty.")]
    EmptyInput,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A service answered, but not with something we can use.
    #[error("{service} error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to extract text: {0}")]
    Extraction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not configured in environment variables.")]
    MissingConfig(&'static str),

    #[error("Failed to save to CosmosDB: {0}")]
    Persistence(String),
}

impl AnalysisError {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            service,
            message: message.into(),
        }
    }

    /// True for failures that came from a remote service rather than from local input.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. } | Self::Service { .. })
    }
}
