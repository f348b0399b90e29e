use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid matcher config: {0}")]
    InvalidConfig(String),
    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),
    #[error("invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },
    #[error("failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse corpus: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_document_display() {
        let err = MatchError::InvalidDocument {
            id: "X1".into(),
            reason: "empty text".into(),
        };
        assert_eq!(err.to_string(), "invalid document X1: empty text");
    }

    #[test]
    fn io_error_converts() {
        let err: MatchError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().contains("failed to read corpus"));
    }
}
