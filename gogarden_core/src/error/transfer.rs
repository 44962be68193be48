//! Network transfer error types

use thiserror::Error;

/// Errors raised while downloading a remote image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The server answered with a non-success status
    #[error("Download of {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Connection, DNS or body streaming failure
    #[error("Transport error while downloading {url}: {message}")]
    Transport { url: String, message: String },

    /// The request exceeded the client timeout
    #[error("Download of {url} timed out")]
    Timeout { url: String },
}

impl TransferError {
    /// Create an HTTP status error
    pub fn http_status(url: &str, status: u16) -> Self {
        Self::HttpStatus {
            url: url.to_string(),
            status,
        }
    }

    /// Create a transport error
    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(url: &str) -> Self {
        Self::Timeout {
            url: url.to_string(),
        }
    }

    /// Check if a later attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpStatus { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Transport { .. } | Self::Timeout { .. } => true,
        }
    }
}
