//! Error type shared by the transport, the pipeline builder and result
//! resources.
//!
//! Every failure is raised where it is detected and propagated unchanged to
//! the caller. Nothing in this crate retries or swallows an error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ImaginaryError>;

#[derive(Error, Debug)]
pub enum ImaginaryError {
    /// The service endpoint is missing or blank at send time.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The upload file does not exist at submission time.
    #[error("Upload file not exists: {}", path.display())]
    Input { path: PathBuf },
    /// The service answered with anything other than HTTP 200.
    #[error("Service responded error {status}: '{body}'")]
    Remote { status: u16, body: String },
    /// An `info` body that is not a JSON object.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// A result resource whose backing store is not usable.
    #[error("Resource error: {0}")]
    Resource(String),
    /// Connection, DNS or body-read failure below the HTTP status level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImaginaryError {
    /// HTTP status carried by a [`ImaginaryError::Remote`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the failure came from the remote service rather than from
    /// local configuration, input or the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
