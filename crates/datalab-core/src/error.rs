//! Error types for DataLab Core

use datalab_client::ApiError;
use std::path::PathBuf;

/// Submission failure; `Display` is the message shown to the operator
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Prompt is empty after trimming
    #[error("Please enter a prompt first.")]
    EmptyPrompt,

    /// A previous submission has not completed
    #[error("a submission is already in flight")]
    InFlight,

    /// Chat backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Whether retrying the same composition could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EmptyPrompt => false,
            Self::InFlight => true,
            Self::Api(e) => e.status().map_or(true, |s| s >= 500 || s == 429),
        }
    }
}

/// Configuration load failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::DataLabConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_message_is_user_facing() {
        assert_eq!(SubmitError::EmptyPrompt.to_string(), "Please enter a prompt first.");
    }

    #[test]
    fn api_error_message_passes_through() {
        let err = SubmitError::from(ApiError::Http {
            status: 500,
            detail: "boom".into(),
        });
        assert_eq!(err.to_string(), "Request failed (500): boom");
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_not_retryable() {
        let err = SubmitError::from(ApiError::Http {
            status: 422,
            detail: "bad payload".into(),
        });
        assert!(!err.is_retryable());
        assert!(!SubmitError::EmptyPrompt.is_retryable());
    }
}
