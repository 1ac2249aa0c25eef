//! Transport error taxonomy

use thiserror::Error;

/// Errors surfaced by the transport client.
///
/// `Transport` means no structured payload was available at all; an
/// `Application` error is a well-formed response that carries the backend's
/// `error` field. A body carrying neither the expected fields nor `error`
/// is reported as `Malformed` rather than assumed to be one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network failure or a body that could not be parsed.
    #[error("cannot reach the PulsePath service: {0}")]
    Transport(String),

    /// Well-formed response carrying an application-level `error` field.
    #[error("{0}")]
    Application(String),

    /// Well-formed response carrying neither the expected fields nor `error`.
    #[error("unexpected response from the PulsePath service")]
    MalformedResponse,

    /// An authenticated endpoint was invoked with no stored credential.
    #[error("not logged in")]
    Unauthenticated,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
