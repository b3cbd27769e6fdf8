//! Error types for the Pocket API client.
//!
//! # Design
//! One variant per failure stage: construction, local validation, encoding,
//! transport and the remote protocol. `Protocol` keeps the status code (when
//! the failure came from a non-200 response) next to the text the service put
//! in its `X-Error` header, since that text is usually the only diagnostic the
//! service gives.

use thiserror::Error;

/// Errors returned by `PocketClient` and its transports.
#[derive(Debug, Error)]
pub enum Error {
    /// The client could not be constructed (e.g. empty consumer key).
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// A caller-supplied argument failed a local check. No request was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A request body could not be serialized, or a response body could not
    /// be decoded as form data.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The request never produced a response: connection failure, timeout or
    /// cancellation through the caller's `Context`.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The service answered, but with a non-200 status or without a field the
    /// operation requires.
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Protocol { status: Option<u16>, message: String },
}

/// Coarse classification of an [`Error`], handy for `match` in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Encoding,
    Transport,
    Protocol,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Encoding(_) => ErrorKind::Encoding,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Protocol { .. } => ErrorKind::Protocol,
        }
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        Error::Protocol {
            status: None,
            message: format!("empty {field} in API response"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encoding(format!("failed to marshal input body: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
