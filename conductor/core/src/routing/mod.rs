//! Model Routing
//!
//! Failover and circuit-breaking across interchangeable model providers.
//!
//! # Architecture
//!
//! ```text
//! +----------------------+
//! |    ModelSelector     |  <-- Ordered candidates per capability
//! +----------+-----------+
//!            |
//!            v
//! +----------------------+      +--------------------+
//! | ModelRoutingExecutor | ---> |  ModelHealthStore  |  <-- Shared, injected
//! +----------+-----------+      +--------------------+
//!            |
//!            v
//! +----------------------+
//! |  ClientRegistry<C>   |  <-- Provider name -> client
//! +----------------------+
//! ```
//!
//! # Design Principles
//!
//! 1. **One fallback loop**: chat, embedding and rerank share the executor
//! 2. **Missing clients are configuration**: skipped, never health-counted
//! 3. **Health is recorded, not enforced**: selection may consult `is_open`

pub mod error;
pub mod executor;
pub mod health;
pub mod selector;
pub mod target;

#[cfg(test)]
pub mod test_utils;

pub use error::RoutingError;
pub use executor::{ModelCaller, ModelRoutingExecutor};
pub use health::{Clock, HealthConfig, HealthSnapshot, ManualClock, ModelHealthStore, SystemClock};
pub use selector::{ConfiguredSelector, ModelSelector};
pub use target::{ModelCapability, ModelTarget};
