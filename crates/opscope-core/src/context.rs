//! Call Context - per-invocation correlation and cancellation
//!
//! Every instrumented call carries a [`CallContext`]. Adapters read the trace
//! id from it when emitting, and the correlator refuses to track calls that
//! arrive without one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Global call counter for trace ID generation
static CALL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a short, unique trace ID for this call
/// Format: 6 hex characters (e.g., "a1b2c3")
pub fn generate_trace_id() -> String {
    let counter = CALL_COUNTER.fetch_add(1, Ordering::Relaxed);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    // Mix counter and timestamp for uniqueness
    let mixed = counter.wrapping_add(timestamp);
    format!("{:06x}", mixed & 0xFFFFFF)
}

/// Context for a single in-flight call.
///
/// Clones share the same cancellation token, so a clone handed to a
/// downstream layer observes cancellation of the original.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Unique trace ID (6 hex chars)
    pub trace_id: String,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a fresh context with a new trace id and no deadline.
    pub fn new() -> Self {
        Self {
            trace_id: generate_trace_id(),
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Reuse an upstream trace id (e.g. propagated through a header).
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Bound the call by a timeout measured from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Derive a child context: same trace id and deadline, a child token
    /// that is cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the call and every child derived from it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// True once the token fired or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}
