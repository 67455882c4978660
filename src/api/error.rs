use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single gateway call.
///
/// The `Display` output is what ends up in the error banner, so it is kept
/// short and human-readable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Server answered with a non-success status
    #[error("{operation} failed ({status}): {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// Request never produced a response (connect, timeout, ...)
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// Response body could not be decoded
    #[error("{operation} returned an unreadable response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        ApiError::Transport {
            operation,
            message: message.into(),
        }
    }

    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        ApiError::Decode {
            operation,
            message: message.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ApiError::Status { operation, .. }
            | ApiError::Transport { operation, .. }
            | ApiError::Decode { operation, .. } => operation,
        }
    }
}
