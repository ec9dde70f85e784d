//! Error handling for siteship.
//!
//! One enum covers the whole pipeline: walking the deploy folder, encoding
//! the archive, talking to blob storage and ARM, and signing transfer URLs.
//! Cleanup failures during the transfer teardown are deliberately NOT an
//! error kind; they are logged and swallowed so they can never mask the
//! error that actually aborted a deploy.

use std::io;

use thiserror::Error;

/// Main error type for siteship operations.
#[derive(Error, Debug)]
pub enum ShipError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File filter error: {0}")]
    Filter(String),

    #[error("Archive encoding error: {0}")]
    Encode(String),

    #[error("Blob upload failed (HTTP {status}): {detail}")]
    Upload { status: u16, detail: String },

    #[error("Signing failed: {0}")]
    Sign(String),

    #[error("Deployment ingestion failed (HTTP {status}, {code}): {message}")]
    Ingestion {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Azure API error (HTTP {status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Deploy manifest error: {0}")]
    Manifest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for siteship operations.
pub type Result<T> = std::result::Result<T, ShipError>;

impl ShipError {
    /// Stable machine-readable code, used in `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "SERIALIZATION_ERROR",
            Self::Filter(_) => "FILTER_IO_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Upload { .. } => "UPLOAD_ERROR",
            Self::Sign(_) => "SIGN_ERROR",
            Self::Ingestion { .. } => "INGESTION_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::MissingConfig(_) => "CONFIG_MISSING_REQUIRED",
            Self::Manifest(_) => "MANIFEST_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
        }
    }

    /// HTTP status attached to this error, if it came from a backend call.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upload { status, .. }
            | Self::Ingestion { status, .. }
            | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
