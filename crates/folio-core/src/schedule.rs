#![forbid(unsafe_code)]

//! Deterministic timer queue driven by a host-controlled clock.
//!
//! This stands in for `setTimeout`: callers [`schedule`](TimerQueue::schedule)
//! a task after a delay, and the host pops due tasks as it advances time.
//!
//! # Invariants
//!
//! 1. The clock is monotonic; moving it backwards is ignored.
//! 2. Tasks pop in (due time, insertion order) order.
//! 3. A task scheduled while draining pops in the same drain if it is due.
//! 4. There is no cancellation: a task always pops once its time comes.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// A min-heap of tasks keyed by due time.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_seq: u64,
    pending: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue with the clock at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BinaryHeap::new(),
        }
    }

    /// Current clock value.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run `task` once `delay` has elapsed from now.
    pub fn schedule(&mut self, delay: Duration, task: T) {
        let due = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.pending.push(Reverse(Entry { due, seq, task }));
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the earliest task due at or before `until`.
    ///
    /// The clock moves to that task's due time, so delays scheduled by the
    /// task are measured from when it ran.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let due = self.next_due()?;
        if due > until {
            return None;
        }
        let Reverse(entry) = self.pending.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    /// Move the clock forward to `now`. Earlier values are ignored.
    pub fn settle_at(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);

    fn drain(q: &mut TimerQueue<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(task) = q.pop_due(until) {
            out.push(task);
        }
        q.settle_at(until);
        out
    }

    #[test]
    fn pops_in_due_then_insertion_order() {
        let mut q = TimerQueue::new();
        q.schedule(MS_200, "late");
        q.schedule(MS_100, "first");
        q.schedule(MS_100, "second");
        assert_eq!(drain(&mut q, MS_200), ["first", "second", "late"]);
        assert!(q.is_empty());
    }

    #[test]
    fn tasks_not_yet_due_stay_queued() {
        let mut q = TimerQueue::new();
        q.schedule(MS_200, "later");
        assert!(drain(&mut q, MS_100).is_empty());
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_due(), Some(MS_200));
        assert_eq!(drain(&mut q, MS_200), ["later"]);
    }

    #[test]
    fn delays_are_measured_from_the_task_that_scheduled_them() {
        let mut q = TimerQueue::new();
        q.schedule(MS_100, 1);
        let until = Duration::from_millis(1000);
        assert_eq!(q.pop_due(until), Some(1));
        assert_eq!(q.now(), MS_100);
        q.schedule(MS_100, 2);
        assert_eq!(q.next_due(), Some(MS_200));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut q: TimerQueue<()> = TimerQueue::new();
        q.settle_at(MS_200);
        q.settle_at(MS_100);
        assert_eq!(q.now(), MS_200);

        // Saturation: don't panic or wrap.
        q.settle_at(Duration::MAX);
        q.schedule(Duration::from_secs(1), ());
        assert_eq!(q.next_due(), Some(Duration::MAX));
    }
}
