//! Client error types

/// Result alias for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure talking to a DataLab backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response; `detail` is the body, or the status reason when empty
    #[error("Request failed ({status}): {detail}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        detail: String,
    },

    /// Connection, timeout or protocol failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx response whose body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL could not be combined with an endpoint path
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status, if the server answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidUrl(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message() {
        let err = ApiError::Http {
            status: 502,
            detail: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed (502): upstream down");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn invalid_url_has_no_status() {
        assert_eq!(ApiError::InvalidUrl("x".into()).status(), None);
    }
}
