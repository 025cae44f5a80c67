use serde_json::Value;

/// Failure of a single ElevenLabs API operation.
///
/// Every public client method funnels its failures into this type; nothing
/// panics past the client boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The remote answered with a non-success status. `body` holds the
    /// structured error payload when one was sent, `Value::Null` otherwise.
    #[error("api returned status {status}: {body}")]
    Status { status: u16, body: Value },

    /// The request never produced an HTTP response (timeout, refused
    /// connection, DNS failure).
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ApiError {
    /// Transient failures are worth retrying: 429, any 5xx, and transport
    /// errors. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            ApiError::Transport { .. } => true,
        }
    }

    /// Status code of the remote answer, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}
