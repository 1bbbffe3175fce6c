use std::collections::HashMap;

use crate::access::QueueKind;

/// A point on one queue's timeline semaphore: "the Nth submission on this
/// queue has completed."
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimelinePoint {
    pub queue: QueueKind,
    pub value: u64,
}

/// Persistent per-queue monotonic counters, owned by the Executor across
/// frames. Submission order is fixed by the Compiler's topological sort, so
/// every cross-queue wait value the Executor will ever need is known the
/// moment the producing group is submitted — there is no runtime feedback
/// loop, just a running counter per queue.
#[derive(Default)]
pub struct TimelineTracker {
    counters: HashMap<QueueKind, u64>,
}

impl TimelineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next submission value for `queue`.
    pub fn next_value(&mut self, queue: QueueKind) -> u64 {
        let counter = self.counters.entry(queue).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn current_value(&self, queue: QueueKind) -> u64 {
        *self.counters.get(&queue).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent_per_queue() {
        let mut tracker = TimelineTracker::new();
        assert_eq!(tracker.next_value(QueueKind::Graphics), 1);
        assert_eq!(tracker.next_value(QueueKind::Graphics), 2);
        assert_eq!(tracker.next_value(QueueKind::Transfer), 1);
        assert_eq!(tracker.current_value(QueueKind::Graphics), 2);
        assert_eq!(tracker.current_value(QueueKind::Compute), 0);
    }
}
