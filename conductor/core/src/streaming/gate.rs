//! Commit gate between a streaming candidate and the real callback
//!
//! [`GatedCallback`] is handed to a provider client in place of the caller's
//! callback. Output passes through to the caller as soon as it appears and
//! releases the [`FirstPacketSignal`]. Errors never pass through: the routing
//! loop decides whether another candidate gets a turn, and the caller must not
//! see a torn stream.
//!
//! Once the routing loop gives up on a candidate it calls
//! [`GatedCallback::abandon`]; everything the candidate emits afterwards is
//! dropped.

use std::sync::Arc;

use parking_lot::Mutex;

use super::awaiter::FirstPacketSignal;
use crate::backend::StreamCallback;

#[derive(Debug, Default)]
struct GateState {
    /// Output has been forwarded to the real callback
    committed: bool,
    /// The routing loop abandoned this candidate
    detached: bool,
}

pub struct GatedCallback {
    inner: Arc<dyn StreamCallback>,
    signal: FirstPacketSignal,
    model_id: String,
    state: Mutex<GateState>,
}

impl GatedCallback {
    pub fn new(
        inner: Arc<dyn StreamCallback>,
        signal: FirstPacketSignal,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            signal,
            model_id: model_id.into(),
            state: Mutex::new(GateState::default()),
        }
    }

    /// Detach from the real callback
    ///
    /// Returns `false` if output was already forwarded, in which case the gate
    /// stays attached: forwarded output cannot be taken back.
    pub fn abandon(&self) -> bool {
        let mut state = self.state.lock();
        if state.committed {
            return false;
        }
        state.detached = true;
        true
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state.lock().committed
    }

    fn forward_chunk(&self, deliver: impl FnOnce(&dyn StreamCallback)) {
        // Held across delivery so abandon() cannot interleave with a chunk.
        let mut state = self.state.lock();
        if state.detached {
            return;
        }
        if !state.committed {
            state.committed = true;
            self.signal.mark_content();
        }
        deliver(self.inner.as_ref());
    }
}

impl StreamCallback for GatedCallback {
    fn on_content(&self, chunk: &str) {
        self.forward_chunk(|cb| cb.on_content(chunk));
    }

    fn on_thinking(&self, chunk: &str) {
        self.forward_chunk(|cb| cb.on_thinking(chunk));
    }

    /// Forwarded only after content
    ///
    /// A completion with no content before it is reported to the awaiter as
    /// [`FirstPacket::NoContent`](crate::streaming::FirstPacket::NoContent) and
    /// not passed on: the caller's stream stays open for the next candidate,
    /// which then delivers the one completion the caller sees.
    fn on_complete(&self) {
        let state = self.state.lock();
        if state.detached {
            return;
        }
        if state.committed {
            self.inner.on_complete();
        } else {
            self.signal.mark_complete();
        }
    }

    fn on_error(&self, error: anyhow::Error) {
        let state = self.state.lock();
        if state.detached {
            return;
        }
        if state.committed {
            tracing::warn!(
                model = %self.model_id,
                error = %error,
                "Stream failed after output was forwarded, suppressing error"
            );
        } else {
            self.signal.mark_error(error);
        }
    }
}
