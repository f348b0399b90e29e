use std::time::Duration;

use thiserror::Error;

/// Failure talking to the generative backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend not ready after {0:?}")]
    NotReady(Duration),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Connection problems, timeouts, readiness and 5xx are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Connect(_) | BackendError::Timeout | BackendError::NotReady(_) => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::Malformed(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("generative backend failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: BackendError,
    },

    #[error("generative backend gave no usable classification")]
    NoResult,

    #[error("generative classification is disabled")]
    Disabled,

    #[error("dispatcher is shut down")]
    Closed,

    #[error("invalid dispatch configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(BackendError::Timeout.is_retryable());
        assert!(BackendError::Connect("refused".into()).is_retryable());
        assert!(BackendError::NotReady(Duration::from_secs(1)).is_retryable());
        assert!(BackendError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!BackendError::Status {
            status: 404,
            body: String::new()
        }
        .is_retryable());
        assert!(!BackendError::Malformed("eof".into()).is_retryable());
    }

    #[test]
    fn exhausted_keeps_source() {
        let err = DispatchError::RetriesExhausted {
            attempts: 3,
            last_error: BackendError::Timeout,
        };
        assert_eq!(
            err.to_string(),
            "generative backend failed after 3 attempts"
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "request timed out");
    }
}
