//! Filesystem error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filesystem error with the path it happened on
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    /// File or directory not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// Disk or quota is full
    StorageFull,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a file not found error
    pub fn file_not_found(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::FileNotFound,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            std::io::ErrorKind::StorageFull => IoErrorKind::StorageFull,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            source: Some(source),
        }
    }

    /// Attach the path the operation was working on
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    let location = error
        .path
        .as_ref()
        .map(|p| format!(": {}", p.display()))
        .unwrap_or_default();

    match error.kind {
        IoErrorKind::FileNotFound => format!("File not found{location}"),
        IoErrorKind::PermissionDenied => format!("Permission denied{location}"),
        IoErrorKind::StorageFull => format!("Storage full{location}"),
        IoErrorKind::Other => match &error.source {
            Some(source) => format!("I/O error{location}: {source}"),
            None => format!("I/O error{location}"),
        },
    }
}
