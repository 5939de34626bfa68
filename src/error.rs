//! Error types for portrait resolution and the download run.

use std::path::PathBuf;

use thiserror::Error;

use crate::http_client::HttpError;

/// Failure of a single provider attempt (or of the whole chain for one entity).
///
/// The display text is what ends up in `download_failures.json`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{subject} HTTP {status}")]
    HttpStatus { subject: String, status: u16 },

    #[error("Wikipedia summary HTTP {status} for {title}")]
    SummaryStatus { title: String, status: u16 },

    #[error("Wikipedia page not found")]
    NotFound,

    #[error("{context}")]
    MissingImage { context: String },

    #[error("{subject} returned invalid JSON: {message}")]
    InvalidPayload { subject: String, message: String },

    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Failed to write {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

impl ResolutionError {
    pub fn http_status(subject: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            subject: subject.into(),
            status,
        }
    }

    pub fn missing_image(context: impl Into<String>) -> Self {
        Self::MissingImage {
            context: context.into(),
        }
    }
}

impl From<HttpError> for ResolutionError {
    fn from(error: HttpError) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }
}

/// Fatal problems that abort the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No celebrities parsed from {path:?}")]
    NoEntities { path: PathBuf },

    #[error("Failed to read source page {path:?}: {source}")]
    SourcePage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create asset directory {path:?}: {source}")]
    AssetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}
