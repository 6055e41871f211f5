use thiserror::Error;

/// Stable message for failures where no response reached the dashboard.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: unable to reach the strategy execution service";

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Failure of the operation wrapped by a `RequestController`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// No response: connection refused, DNS, TLS, transport timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Api {
        status: u16,
        detail: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Single human-readable line for the dashboard.
    ///
    /// Prefers the service's structured `detail`, then the raw message, then
    /// a fixed fallback. Transport internals never leak through.
    pub fn user_message(&self) -> String {
        let raw = match self {
            FetchError::Network(_) => return NETWORK_ERROR_MESSAGE.to_string(),
            FetchError::Api {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.as_str(),
            FetchError::Api { message, .. } => message.as_str(),
            FetchError::Other(message) => message.as_str(),
        };

        if raw.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            raw.to_string()
        }
    }
}
