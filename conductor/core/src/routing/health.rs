//! Model Health Store
//!
//! Circuit-breaker bookkeeping per model id. Every routed call reports its
//! outcome here; after `failure_threshold` consecutive failures the model's
//! circuit opens for `open_duration`.
//!
//! # Circuit States
//!
//! ```text
//!              failure_threshold consecutive failures
//!   CLOSED ──────────────────────────────────────────────> OPEN
//!     ^                                                     │
//!     │  mark_success            open_duration elapsed      │
//!     └─────────────────────────────────────────────────────┘
//! ```
//!
//! Tripping the circuit resets the failure counter, so re-opening after the
//! cooldown needs a fresh run of failures.
//!
//! The store only records health. The routing executor does not consult
//! [`ModelHealthStore::is_open`] before calling a target; candidate selection
//! can opt in to that.
//!
//! State lives in memory for the lifetime of the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

// ============================================================================
// Clock
// ============================================================================

/// Wall-clock source for circuit timing
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Clock backed by [`SystemTime`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Circuit breaker parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    /// Consecutive failures that open the circuit (0 is treated as 1)
    pub failure_threshold: u32,
    /// How long an opened circuit stays open
    pub open_duration: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            open_duration: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Default, Clone)]
struct HealthRecord {
    consecutive_failures: u32,
    open_until: Option<u64>,
}

/// Point-in-time view of one model's record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub model_id: String,
    pub consecutive_failures: u32,
    /// Epoch millis until which the circuit is open
    pub open_until: Option<u64>,
    pub is_open: bool,
    /// Time left before the circuit closes (zero when closed)
    pub remaining: Duration,
}

// ============================================================================
// Store
// ============================================================================

/// Concurrent per-model circuit breaker
///
/// Each mutation runs under the map's per-key entry lock, so racing updates to
/// the same id are serialized and never lost.
pub struct ModelHealthStore {
    records: DashMap<String, HealthRecord>,
    failure_threshold: u32,
    open_duration_ms: u64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ModelHealthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHealthStore")
            .field("tracked", &self.records.len())
            .field("failure_threshold", &self.failure_threshold)
            .field("open_duration_ms", &self.open_duration_ms)
            .finish()
    }
}

impl Default for ModelHealthStore {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

impl ModelHealthStore {
    /// Create a store using the system clock
    pub fn new(config: HealthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store with an explicit clock
    pub fn with_clock(config: HealthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            failure_threshold: config.failure_threshold.max(1),
            open_duration_ms: config.open_duration.as_millis() as u64,
            clock,
        }
    }

    /// Record a successful call: clears the failure run and closes the circuit
    pub fn mark_success(&self, model_id: &str) {
        if model_id.is_empty() {
            return;
        }

        let mut record = self.records.entry(model_id.to_string()).or_default();
        let was_open = record.open_until.is_some();
        record.consecutive_failures = 0;
        record.open_until = None;
        drop(record);

        if was_open {
            tracing::info!(model = %model_id, "Circuit closed after successful call");
        }
    }

    /// Record a failed call, opening the circuit at the threshold
    pub fn mark_failure(&self, model_id: &str) {
        if model_id.is_empty() {
            return;
        }

        let now = self.clock.now_millis();
        let mut record = self.records.entry(model_id.to_string()).or_default();
        record.consecutive_failures += 1;

        let tripped = record.consecutive_failures >= self.failure_threshold;
        if tripped {
            record.open_until = Some(now.saturating_add(self.open_duration_ms));
            record.consecutive_failures = 0;
        }
        let failures = record.consecutive_failures;
        drop(record);

        if tripped {
            tracing::warn!(
                model = %model_id,
                open_for_ms = self.open_duration_ms,
                "Circuit opened after consecutive failures"
            );
        } else {
            tracing::debug!(model = %model_id, failures, "Recorded model failure");
        }
    }

    /// True iff a record exists and its circuit is still open
    #[must_use]
    pub fn is_open(&self, model_id: &str) -> bool {
        let now = self.clock.now_millis();
        self.records
            .get(model_id)
            .and_then(|r| r.open_until)
            .is_some_and(|until| until > now)
    }

    #[must_use]
    pub fn snapshot(&self, model_id: &str) -> Option<HealthSnapshot> {
        let now = self.clock.now_millis();
        self.records
            .get(model_id)
            .map(|r| Self::to_snapshot(model_id, &r, now))
    }

    /// Ids whose circuit is currently open, sorted
    #[must_use]
    pub fn open_models(&self) -> Vec<String> {
        let now = self.clock.now_millis();
        let mut ids: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.open_until.is_some_and(|until| until > now))
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    fn to_snapshot(model_id: &str, record: &HealthRecord, now: u64) -> HealthSnapshot {
        let remaining_ms = record
            .open_until
            .map(|until| until.saturating_sub(now))
            .unwrap_or(0);
        HealthSnapshot {
            model_id: model_id.to_string(),
            consecutive_failures: record.consecutive_failures,
            open_until: record.open_until,
            is_open: remaining_ms > 0,
            remaining: Duration::from_millis(remaining_ms),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
