//! Routing errors

use std::fmt;

use thiserror::Error;

use super::target::ModelCapability;

/// Errors surfaced to callers of the routing services
///
/// Per-candidate failures never appear here individually; they are logged and
/// only the last one rides along on the exhaustion variants.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The selector produced no candidates for the capability
    #[error("No {capability} model candidates available")]
    NoCandidates { capability: ModelCapability },

    /// Streaming chat had no candidates to try
    #[error("No chat model provider available")]
    NoProvider,

    /// Every candidate was tried and failed
    #[error("All {capability} model candidates failed: {}", describe(.last_error))]
    AllCandidatesFailed {
        capability: ModelCapability,
        #[source]
        last_error: Option<anyhow::Error>,
    },

    /// The caller cancelled while waiting for a first packet
    #[error("Streaming request was interrupted")]
    StreamInterrupted,

    /// No streaming candidate produced output
    ///
    /// The message is shown to end users. The underlying cause is kept for logs.
    #[error("Model call failed, please try again later")]
    StreamExhausted {
        #[source]
        last_error: Option<anyhow::Error>,
    },
}

impl RoutingError {
    /// The last per-candidate cause, when one was recorded
    ///
    /// Also reachable through [`std::error::Error::source`].
    #[must_use]
    pub fn last_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::AllCandidatesFailed { last_error, .. } | Self::StreamExhausted { last_error } => {
                last_error.as_ref()
            }
            _ => None,
        }
    }
}

fn describe(error: &Option<anyhow::Error>) -> DescribeCause<'_> {
    DescribeCause(error.as_ref())
}

struct DescribeCause<'a>(Option<&'a anyhow::Error>);

impl fmt::Display for DescribeCause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(e) => write!(f, "{e}"),
            None => f.write_str("unknown"),
        }
    }
}
