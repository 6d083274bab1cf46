//! Error types and result handling.
//!
//! The crate distinguishes exactly three failure kinds:
//!
//! - [`ClientError::Api`] - the server answered with a non-success HTTP
//!   status. This is the one error that travels on two channels: it is
//!   handed to the client's registered error observer *and* returned to the
//!   caller, carrying the same `status` and `message`.
//! - [`ClientError::Transport`] - the request never produced a usable
//!   response (connection refused, timeout, interrupted body). These pass
//!   through from the HTTP layer without further classification.
//! - [`ClientError::Decode`] - a typed endpoint expected a JSON shape the
//!   response body did not match.
//!
//! Structural token invalidity and token-storage failures are *not* errors;
//! they silently degrade to "no token" at the [`crate::token`] boundary.

use thiserror::Error;

/// Result type for all client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Normalized failure response from the server.
///
/// Produced whenever a request completes with a status outside the success
/// range. The message is the status's canonical reason phrase, extended with
/// the response body text when the body is non-empty:
///
/// ```text
/// Not Found: pipeline does not exist
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status code of the failed response.
    pub status: u16,
    /// Reason phrase, plus `": "` and the body text when one was sent.
    pub message: String,
}

/// Errors returned by [`crate::ApiClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success HTTP status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request failed below the HTTP layer.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body could not be decoded into the expected type.
    #[error("response decode: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The server failure behind this error, if it is one.
    ///
    /// Lets call sites branch on `status` without destructuring the enum.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }
}
