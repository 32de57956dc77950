//! Deferred tasks on the pipeline's serial queue.
//!
//! # Why not just sleep? (for beginners)
//!
//! A chain link must never block: while it waits, no other input could be
//! processed. Instead, a link that needs "do X in 300 ms" asks the
//! [`Scheduler`] for a deferred task and gets a [`CancelToken`] back. The
//! owner of the pipeline (a test, or the tokio runtime driver) asks for the
//! next deadline, waits for it however it likes, and then advances the
//! virtual clock, which fires every task that is due, one at a time, in
//! deadline order. Tasks with equal deadlines fire in the order they were
//! scheduled.
//!
//! A link keeps the token of every task it owns and cancels it when it leaves
//! the state that scheduled it. Cancelling an already-fired or unknown token
//! is a no-op.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use a11y_core::Timestamp;

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelToken(u64);

/// A virtual clock plus an ordered set of pending tasks of type `T`.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Timestamp,
    next_id: u64,
    pending: BTreeMap<(Timestamp, u64), T>,
    deadlines: HashMap<u64, Timestamp>,
}

impl<T> Scheduler<T> {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Schedules `task` to fire `delay` after the current virtual time.
    pub fn schedule_after(&mut self, delay: Duration, task: T) -> CancelToken {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.now + delay;
        self.pending.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        CancelToken(id)
    }

    /// Cancels a pending task. Returns `true` if it had not fired yet.
    pub fn cancel(&mut self, token: CancelToken) -> bool {
        match self.deadlines.remove(&token.0) {
            Some(deadline) => self.pending.remove(&(deadline, token.0)).is_some(),
            None => false,
        }
    }

    /// Cancels every pending task matching `pred`; returns how many.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let doomed: Vec<(Timestamp, u64)> = self
            .pending
            .iter()
            .filter(|(_, task)| pred(task))
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            self.pending.remove(key);
            self.deadlines.remove(&key.1);
        }
        doomed.len()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes the earliest task due at or before `until` and moves the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until: Timestamp) -> Option<T> {
        let key = *self.pending.keys().next()?;
        if key.0 > until {
            return None;
        }
        self.deadlines.remove(&key.1);
        if key.0 > self.now {
            self.now = key.0;
        }
        self.pending.remove(&key)
    }

    /// Moves the clock forward; it never moves backward.
    pub fn set_now(&mut self, now: Timestamp) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
