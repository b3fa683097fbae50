// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Network middleware error: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("Unexpected page layout at '{url}': {message}")]
    Structure { url: String, message: String },
    #[error("Fingerprint store '{}' unavailable: {message}", path.display())]
    Store { path: PathBuf, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to move downloaded file into place: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Interrupted by user")]
    UserInterrupt,
    #[error("{0}")] // message is already user-facing
    UserInputError(String),
    #[error("Unknown error: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn structure(url: impl ToString, message: impl Into<String>) -> Self {
        Self::Structure {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for failures of the HTTP layer (connection, timeout, non-2xx).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::NetworkMiddleware(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
