//! Generic Fallback Execution
//!
//! One capability-agnostic fallback strategy shared by chat, embedding and
//! rerank. The executor walks an ordered candidate list, resolves a client per
//! target, invokes it through a [`ModelCaller`], records the outcome in the
//! [`ModelHealthStore`] and returns the first success.
//!
//! ```text
//! targets ──> resolve client ──(none)──> skip, health untouched
//!                  │
//!                  v
//!            caller.call(client, target)
//!              │              │
//!           Ok(T)           Err(e)
//!              │              │
//!       mark_success     mark_failure, remember e, next target
//!         return T
//! ```

use std::future::Future;
use std::sync::Arc;

use super::error::RoutingError;
use super::health::ModelHealthStore;
use super::target::{ModelCapability, ModelTarget};
use crate::backend::ModelClientError;

/// Invoke a client of type `C` against a target, producing `T`
///
/// Implemented for every `Fn(Arc<C>, ModelTarget) -> impl Future<Output =
/// anyhow::Result<T>>`, so call sites pass closures.
pub trait ModelCaller<C: ?Sized, T> {
    type Future: Future<Output = anyhow::Result<T>>;

    fn call(&self, client: Arc<C>, target: ModelTarget) -> Self::Future;
}

impl<C, T, F, Fut> ModelCaller<C, T> for F
where
    C: ?Sized,
    F: Fn(Arc<C>, ModelTarget) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    type Future = Fut;

    fn call(&self, client: Arc<C>, target: ModelTarget) -> Fut {
        self(client, target)
    }
}

/// Ordered fallback over model candidates
#[derive(Debug, Clone)]
pub struct ModelRoutingExecutor {
    health: Arc<ModelHealthStore>,
}

impl ModelRoutingExecutor {
    pub fn new(health: Arc<ModelHealthStore>) -> Self {
        Self { health }
    }

    #[must_use]
    pub fn health(&self) -> &Arc<ModelHealthStore> {
        &self.health
    }

    /// Try `targets` in order until one call succeeds
    ///
    /// Targets whose provider has no client are skipped without a health
    /// update. Open circuits are not consulted here.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::NoCandidates`] if `targets` is empty
    /// - [`RoutingError::AllCandidatesFailed`] with the last cause once every
    ///   target was skipped or failed
    pub async fn execute_with_fallback<C, T, R, M>(
        &self,
        capability: ModelCapability,
        targets: &[ModelTarget],
        resolve: R,
        caller: M,
    ) -> Result<T, RoutingError>
    where
        C: ?Sized,
        R: Fn(&ModelTarget) -> Option<Arc<C>>,
        M: ModelCaller<C, T>,
    {
        if targets.is_empty() {
            return Err(RoutingError::NoCandidates { capability });
        }

        let mut last_error: Option<anyhow::Error> = None;

        for target in targets {
            let Some(client) = resolve(target) else {
                tracing::warn!(
                    capability = %capability,
                    model = %target.id(),
                    provider = %target.provider_name(),
                    "No client registered for provider, skipping candidate"
                );
                continue;
            };

            match caller.call(client, target.clone()).await {
                Ok(result) => {
                    self.health.mark_success(target.id());
                    tracing::debug!(capability = %capability, model = %target.id(), "Model call succeeded");
                    return Ok(result);
                }
                Err(e) => {
                    self.health.mark_failure(target.id());
                    log_failure(capability, target, &e);
                    last_error = Some(e);
                }
            }
        }

        Err(RoutingError::AllCandidatesFailed {
            capability,
            last_error,
        })
    }
}

fn log_failure(capability: ModelCapability, target: &ModelTarget, error: &anyhow::Error) {
    match error.downcast_ref::<ModelClientError>() {
        Some(typed) => tracing::warn!(
            capability = %capability,
            model = %target.id(),
            kind = %typed.kind(),
            status = ?typed.status(),
            error = %error,
            "Model call failed, trying next candidate"
        ),
        None => tracing::warn!(
            capability = %capability,
            model = %target.id(),
            error = %error,
            "Model call failed, trying next candidate"
        ),
    }
}
