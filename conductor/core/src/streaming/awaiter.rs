//! First-packet awaiter
//!
//! One-shot rendezvous between the routing task and a provider's delivery
//! task. The provider side fires exactly one meaningful signal (content,
//! completion or error); the routing side waits for it with a bound and a
//! cancellation token.
//!
//! ```text
//!   NOT_SIGNALLED ──mark_content──> CONTENT
//!        │  │
//!        │  └──────mark_complete──> COMPLETED
//!        └─────────mark_error─────> ERRORED
//! ```
//!
//! The first signal wins; later ones are ignored.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// What a streaming candidate did first
#[derive(Debug)]
pub enum FirstPacket {
    /// A content or thinking chunk arrived
    Content,
    /// The stream completed without producing content
    NoContent,
    /// The stream failed before producing content
    Error(anyhow::Error),
    /// Nothing arrived within the bound
    Timeout,
}

impl FirstPacket {
    #[must_use]
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content)
    }
}

/// The caller cancelled while waiting
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("first packet wait was interrupted")]
pub struct Interrupted;

#[derive(Debug)]
enum Signal {
    Content,
    Complete,
    Error(anyhow::Error),
}

/// Provider-side half of a [`FirstPacketAwaiter`]
///
/// Cheap to clone. Every method reports whether this call was the one that
/// released the waiter.
#[derive(Debug, Clone)]
pub struct FirstPacketSignal {
    slot: Arc<Mutex<Option<oneshot::Sender<Signal>>>>,
}

impl FirstPacketSignal {
    pub fn mark_content(&self) -> bool {
        self.fire(Signal::Content)
    }

    pub fn mark_complete(&self) -> bool {
        self.fire(Signal::Complete)
    }

    /// Release the waiter with an error; the error is not forwarded anywhere else
    pub fn mark_error(&self, error: anyhow::Error) -> bool {
        self.fire(Signal::Error(error))
    }

    #[must_use]
    pub fn is_signalled(&self) -> bool {
        self.slot.lock().is_none()
    }

    fn fire(&self, signal: Signal) -> bool {
        match self.slot.lock().take() {
            Some(tx) => {
                // The waiter may already have given up; the signal is still spent.
                let _ = tx.send(signal);
                true
            }
            None => false,
        }
    }
}

/// Routing-side half: created per streaming attempt, consumed by [`Self::wait`]
#[derive(Debug)]
pub struct FirstPacketAwaiter {
    signal: FirstPacketSignal,
    rx: oneshot::Receiver<Signal>,
}

impl Default for FirstPacketAwaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl FirstPacketAwaiter {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            signal: FirstPacketSignal {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        }
    }

    /// Handle for the delivery side
    #[must_use]
    pub fn signal(&self) -> FirstPacketSignal {
        self.signal.clone()
    }

    pub fn mark_content(&self) -> bool {
        self.signal.mark_content()
    }

    pub fn mark_complete(&self) -> bool {
        self.signal.mark_complete()
    }

    pub fn mark_error(&self, error: anyhow::Error) -> bool {
        self.signal.mark_error(error)
    }

    /// Wait for the first signal, at most `timeout`
    ///
    /// A timeout is an ordinary outcome. If every signal handle is dropped
    /// without firing, the result is [`FirstPacket::Error`].
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] when `cancel` fires first.
    pub async fn wait(
        self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<FirstPacket, Interrupted> {
        let Self { signal, rx } = self;
        drop(signal);

        tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(Interrupted),

            received = tokio::time::timeout(timeout, rx) => Ok(match received {
                Err(_) => FirstPacket::Timeout,
                Ok(Ok(Signal::Content)) => FirstPacket::Content,
                Ok(Ok(Signal::Complete)) => FirstPacket::NoContent,
                Ok(Ok(Signal::Error(e))) => FirstPacket::Error(e),
                Ok(Err(_)) => FirstPacket::Error(anyhow::anyhow!("stream closed without signalling")),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const BOUND: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_signal() {
        let awaiter = FirstPacketAwaiter::new();
        let _signal = awaiter.signal();
        let start = Instant::now();

        let result = awaiter.wait(BOUND, &CancellationToken::new()).await;

        assert!(matches!(result, Ok(FirstPacket::Timeout)));
        let elapsed = start.elapsed();
        assert!(elapsed >= BOUND);
        assert!(elapsed < BOUND + Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_content_releases_waiter() {
        let awaiter = FirstPacketAwaiter::new();
        let signal = awaiter.signal();

        tokio::spawn(async move {
            assert!(signal.mark_content());
        });

        let result = awaiter.wait(BOUND, &CancellationToken::new()).await;
        assert!(matches!(result, Ok(FirstPacket::Content)));
    }

    #[tokio::test]
    async fn test_complete_maps_to_no_content() {
        let awaiter = FirstPacketAwaiter::new();
        awaiter.mark_complete();

        let result = awaiter.wait(BOUND, &CancellationToken::new()).await;
        assert!(matches!(result, Ok(FirstPacket::NoContent)));
    }

    #[tokio::test]
    async fn test_error_carries_cause() {
        let awaiter = FirstPacketAwaiter::new();
        awaiter.mark_error(anyhow::anyhow!("HTTP 500"));

        match awaiter.wait(BOUND, &CancellationToken::new()).await {
            Ok(FirstPacket::Error(e)) => assert_eq!(e.to_string(), "HTTP 500"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_signal_wins() {
        let awaiter = FirstPacketAwaiter::new();
        let signal = awaiter.signal();

        assert!(signal.mark_content());
        assert!(!signal.mark_complete());
        assert!(!signal.mark_error(anyhow::anyhow!("late")));
        assert!(signal.is_signalled());

        let result = awaiter.wait(BOUND, &CancellationToken::new()).await;
        assert!(matches!(result, Ok(FirstPacket::Content)));
    }

    #[tokio::test]
    async fn test_signal_after_wait_does_not_panic() {
        let awaiter = FirstPacketAwaiter::new();
        let signal = awaiter.signal();

        let result = awaiter
            .wait(Duration::from_millis(1), &CancellationToken::new())
            .await;
        assert!(matches!(result, Ok(FirstPacket::Timeout)));

        assert!(signal.mark_content());
        assert!(!signal.mark_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts() {
        let awaiter = FirstPacketAwaiter::new();
        let _signal = awaiter.signal();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = awaiter.wait(BOUND, &cancel).await;
        assert_eq!(result.unwrap_err(), Interrupted);
    }

    #[tokio::test]
    async fn test_dropped_signals_resolve_as_error() {
        let awaiter = FirstPacketAwaiter::new();
        let signal = awaiter.signal();
        drop(signal);

        let result = awaiter.wait(BOUND, &CancellationToken::new()).await;
        assert!(matches!(result, Ok(FirstPacket::Error(_))));
    }
}
