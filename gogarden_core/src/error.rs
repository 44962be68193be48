//! Error types for the GoGarden core library
//!
//! Errors are grouped by where they come from so call sites can decide how
//! to degrade. The consumer-facing cache API never hands these out: it logs
//! them and falls back to a negative result instead.

use thiserror::Error;

pub mod internal;
pub mod io;
pub mod transfer;
pub mod validation;

pub use self::io::{IoError, IoErrorKind};
pub use self::transfer::TransferError;
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the GoGarden core library
///
/// - I/O errors: stat/read/write/delete failures on the cache directory
/// - Transfer errors: non-success statuses and transport failures
/// - Validation errors: bad policy values
/// - Internal errors: serialization and task failures
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Network transfer errors
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// True when the error only means "the thing is not there"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(io) if io.kind == IoErrorKind::FileNotFound)
    }

    /// True for transfer failures a later request could get past
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transfer(transfer) if transfer.is_transient())
    }
}

// Conversions from external error types

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(InternalError::serialization(err.to_string()))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        if err.is_timeout() {
            Self::Transfer(TransferError::timeout(&url))
        } else if let Some(status) = err.status() {
            Self::Transfer(TransferError::http_status(&url, status.as_u16()))
        } else {
            Self::Transfer(TransferError::transport(&url, err.to_string()))
        }
    }
}
