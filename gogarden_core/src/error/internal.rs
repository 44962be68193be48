//! Internal library error types

use thiserror::Error;

/// Internal library errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// JSON (de)serialization failure
    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    /// A background task panicked or was cancelled
    #[error("Background task failed: {message}")]
    TaskJoin { message: String },
}

impl InternalError {
    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a task join error
    pub fn task_join(message: impl Into<String>) -> Self {
        Self::TaskJoin {
            message: message.into(),
        }
    }
}

impl From<tokio::task::JoinError> for InternalError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::task_join(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error() {
        let error = InternalError::serialization("expected value at line 1");
        assert!(error.to_string().contains("Serialization failed"));
        assert!(error.to_string().contains("line 1"));
    }

    #[tokio::test]
    async fn test_from_join_error() {
        let handle = tokio::spawn(async { panic!("worker blew up") });
        let join_err = handle.await.unwrap_err();
        let error: InternalError = join_err.into();
        assert!(matches!(error, InternalError::TaskJoin { .. }));
    }
}
