use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::abstractions::{ProcessId, Timestamp};

/// Lamport logical clock owned by a single process.
///
/// The counter starts at 0 and only moves through [`LogicalClock::tick`].
/// Only the owning process calls `tick`, but the update is an atomic
/// compare-and-swap so the rule holds under any caller.
#[derive(Debug)]
pub struct LogicalClock {
    owner: ProcessId,
    counter: AtomicU64,
}

impl LogicalClock {
    pub fn new(owner: ProcessId) -> Self {
        Self {
            owner,
            counter: AtomicU64::new(0),
        }
    }

    pub fn owner(&self) -> ProcessId {
        self.owner
    }

    pub fn current(&self) -> Timestamp {
        self.counter.load(Ordering::Acquire)
    }

    /// Advances the clock to `max(current, incoming) + 1` and returns the new value.
    ///
    /// Local events pass `incoming = 0`. The counter saturates at `u64::MAX`;
    /// once there, further ticks return `u64::MAX` instead of overflowing.
    pub fn tick(&self, incoming: Timestamp) -> Timestamp {
        let mut current = self.counter.load(Ordering::Acquire);
        loop {
            let next = current.max(incoming).saturating_add(1);
            match self.counter.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    trace!(process = self.owner, tick = next, "clock advanced");
                    return next;
                }
                Err(observed) => current = observed,
            }
        }
    }
}
