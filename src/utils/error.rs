//! Error handling for BorgorTube

use thiserror::Error;

/// Why a `resolve` call gave up after the anonymous attempt failed.
#[derive(Debug, Error)]
pub enum ExtractionCause {
    #[error("credential acquisition failed: {0}")]
    CredentialAcquisitionFailed(String),

    #[error("credentialed retry failed: {0}")]
    CredentialedRetryFailed(String),
}

/// Main error type for BorgorTube
#[derive(Debug, Error)]
pub enum BorgorError {
    #[error("{0} not found. Please install it or set its path in settings.json")]
    ToolNotFound(&'static str),

    #[error("Failed to extract video info: {cause}")]
    ExtractionError { cause: ExtractionCause },

    #[error("Credential acquisition failed: {0}")]
    CredentialAcquisition(String),

    #[error("Player failed to start: {0}")]
    PlaybackLaunch(String),

    #[error("Control channel error: {0}")]
    ControlChannel(String),

    #[error("No video is loaded")]
    NoActiveSession,

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl BorgorError {
    pub fn extraction(cause: ExtractionCause) -> Self {
        Self::ExtractionError { cause }
    }
}

pub type Result<T, E = BorgorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_message_includes_cause() {
        let err = BorgorError::extraction(ExtractionCause::CredentialAcquisitionFailed(
            "browser crashed".into(),
        ));
        assert_eq!(
            err.to_string(),
            "Failed to extract video info: credential acquisition failed: browser crashed"
        );
    }
}
