use crate::http::response::Response;
use std::time::Duration;
use thiserror::Error;

/// Every way a call can end without a usable response.
///
/// Transport errors are opaque: the retry engine only ever looks at their
/// rendered message, matching it against [`RetryOptions::error_codes`].
///
/// [`RetryOptions::error_codes`]: crate::options::RetryOptions::error_codes
#[derive(Debug, Error)]
pub enum NetError {
    // Configuration Errors
    #[error("Configuration merge failed: {reason}")]
    ConfigMerge { reason: String },
    #[error("Request body could not be encoded: {reason}")]
    BodyEncoding { reason: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("No adapter configured")]
    MissingAdapter,

    // Transport Errors
    #[error("{message}")]
    Transport { message: String },
    #[error("ETIMEDOUT: attempt timed out after {0:?}")]
    Timeout(Duration),

    // Lifecycle Errors
    #[error("Request failed and maximum amount of retries exceeded. Retried {retries} time(s)")]
    MaxRetriesExceeded {
        retries: u32,
        last_response: Option<Box<Response>>,
        last_error: Option<Box<NetError>>,
    },
    #[error("Maximum amount of redirects reached. Redirected {redirects} time(s)")]
    MaxRedirectsExceeded { redirects: usize },
    #[error("Hook failed: {0}")]
    Hook(String),

    // Body Errors
    #[error("Response body already consumed")]
    BodyConsumed,
    #[error("Response body read failed: {0}")]
    HttpBody(String),
    #[error("Response body is not valid UTF-8")]
    InvalidUtf8,
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl NetError {
    /// Create an opaque transport error from any displayable cause.
    pub fn transport(message: impl Into<String>) -> Self {
        NetError::Transport {
            message: message.into(),
        }
    }

    /// Create an error raised from inside a hook.
    pub fn hook(message: impl Into<String>) -> Self {
        NetError::Hook(message.into())
    }

    /// Whether this error came from the transport rather than from the
    /// orchestrator's own bookkeeping.
    pub fn is_transport(&self) -> bool {
        matches!(self, NetError::Transport { .. } | NetError::Timeout(_))
    }

    /// The last response seen before the retry ceiling was hit, if any.
    pub fn last_response(&self) -> Option<&Response> {
        match self {
            NetError::MaxRetriesExceeded { last_response, .. } => last_response.as_deref(),
            _ => None,
        }
    }

    /// Take ownership of the last response carried by a retry-ceiling error.
    pub fn into_last_response(self) -> Option<Response> {
        match self {
            NetError::MaxRetriesExceeded { last_response, .. } => last_response.map(|r| *r),
            _ => None,
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(err: url::ParseError) -> Self {
        NetError::InvalidUrl(err.to_string())
    }
}
