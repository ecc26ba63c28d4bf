//! Streaming Commit Gating
//!
//! A streamed answer is irreversible: once a chunk reaches the client it
//! cannot be taken back. Streaming fallback therefore has to learn whether a
//! candidate is alive before anything is committed to the caller.
//!
//! # Architecture
//!
//! ```text
//!  routing task                              provider task
//!  ────────────                              ─────────────
//!  FirstPacketAwaiter::new()
//!  GatedCallback(real, signal) ────────────> client.stream_chat(gate)
//!  awaiter.wait(timeout, cancel)                  │
//!        ^                                        │ on_content / on_complete / on_error
//!        │            FirstPacketSignal           v
//!        └──────────────────────────────────  GatedCallback
//!                                                 │ content only
//!                                                 v
//!                                           real StreamCallback
//! ```
//!
//! - [`FirstPacketAwaiter`]: one-shot, bounded, cancellable wait
//! - [`GatedCallback`]: forwards output, withholds errors, detaches on demand

mod awaiter;
mod gate;

pub use awaiter::{FirstPacket, FirstPacketAwaiter, FirstPacketSignal, Interrupted};
pub use gate::GatedCallback;
