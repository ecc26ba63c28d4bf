//! Typed provider client failures
//!
//! Clients return `anyhow::Error`; when they can classify a failure they wrap a
//! [`ModelClientError`] so routing logs can show what went wrong.

use std::fmt;

use thiserror::Error;

/// Failure category reported by a provider client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelClientErrorKind {
    /// Authentication failed or the token is invalid
    Unauthorized,
    /// Provider rate limit exceeded
    RateLimited,
    /// Provider-side internal error
    ServerError,
    /// Malformed request
    ClientError,
    /// Connection failure or timeout
    NetworkError,
    /// Response could not be interpreted
    InvalidResponse,
    /// Any other provider failure
    ProviderError,
}

impl ModelClientErrorKind {
    /// Classify an HTTP status code
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            429 => Self::RateLimited,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::ProviderError,
        }
    }
}

impl fmt::Display for ModelClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::NetworkError => "network_error",
            Self::InvalidResponse => "invalid_response",
            Self::ProviderError => "provider_error",
        };
        f.write_str(name)
    }
}

/// A classified provider failure
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ModelClientError {
    kind: ModelClientErrorKind,
    status: Option<u16>,
    message: String,
}

impl ModelClientError {
    pub fn new(kind: ModelClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Build from an HTTP status, classifying it
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ModelClientErrorKind::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ModelClientErrorKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}
