//! Process-wide work item sequence numbers.
//!
//! The counter is the only mutable state shared between concurrent
//! deliveries. Each call to [`SequenceCounter::next`] is one atomic
//! `fetch_add`, so concurrent callers never observe the same value.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::SequenceNumber;

/// Default starting value when none is configured.
pub const DEFAULT_INITIAL_SEQUENCE: SequenceNumber = 1;

/// Monotonic, process-scoped sequence counter.
///
/// Values carry no meaning across restarts or across replicas; they exist to
/// correlate log lines for one delivery.
#[derive(Debug)]
pub struct SequenceCounter {
    value: AtomicI64,
}

impl SequenceCounter {
    /// Create a counter holding `initial`. The first [`next`](Self::next)
    /// returns `initial + 1`.
    pub fn new(initial: SequenceNumber) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    /// Increment and return the post-increment value.
    pub fn next(&self) -> SequenceNumber {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued value (or the initial value if none issued).
    pub fn current(&self) -> SequenceNumber {
        self.value.load(Ordering::SeqCst)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_SEQUENCE)
    }
}
