//! Error types returned by the timer client.

use thiserror::Error;

use crate::dto::timer::TimerSnapshot;

/// Convenient result alias returning [`ClientError`] failures.
pub type ClientResult<T> = Result<T, ClientError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that can occur while talking to the timer authority.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required environment variable is missing.
    #[error("missing round timer environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// Environment variable is present but unusable.
    #[error("invalid value for `{var}`: {value}")]
    InvalidEnvVar {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build timer client")]
    ClientBuilder {
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// The request could not be sent or no response arrived.
    #[error("failed to send timer request to `{path}`")]
    RequestSend {
        /// Request path.
        path: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// The authority answered with a non-success status.
    #[error("timer request to `{path}` refused with status {status}: {message}")]
    Rejected {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Reason given by the authority.
        message: String,
        /// Unchanged authoritative state, when the authority included it.
        timer: Option<Box<TimerSnapshot>>,
    },
    /// Response payload could not be parsed.
    #[error("failed to decode timer response for `{path}`")]
    DecodeResponse {
        /// Request path.
        path: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

impl ClientError {
    /// Authoritative state carried by a rejection, if any.
    pub fn timer(&self) -> Option<&TimerSnapshot> {
        match self {
            ClientError::Rejected { timer, .. } => timer.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
