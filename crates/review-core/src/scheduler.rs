//! Keyed, cancelable trailing-debounce timers.
//!
//! The scheduler does not own a clock or run callbacks. The host event loop passes the current
//! [`Instant`] in and dispatches on the keys returned by [`Debouncer::poll`]. Scheduling a key
//! that is already pending replaces (cancels) the earlier timer.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Handle identifying one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    deadline: Instant,
}

/// Trailing debouncer keyed by `K`.
#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    pending: HashMap<K, Pending>,
    next_handle: u64,
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            next_handle: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    /// Create an idle debouncer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to fire `delay` after `now`, cancelling any pending timer for it.
    pub fn schedule(&mut self, key: K, delay: Duration, now: Instant) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.pending.insert(
            key,
            Pending {
                handle,
                deadline: now + delay,
            },
        );
        handle
    }

    /// Cancel the pending timer for `key`; returns whether one was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    /// `true` if `key` is armed.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Handle of the timer currently armed for `key`.
    pub fn handle(&self, key: &K) -> Option<TimerHandle> {
        self.pending.get(key).map(|pending| pending.handle)
    }

    /// Earliest deadline among armed timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }

    /// Remove and return every key whose deadline is at or before `now`, in firing order.
    pub fn poll(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, TimerHandle, K)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(key, armed)| (armed.deadline, armed.handle, key.clone()))
            .collect();
        due.sort_by_key(|(deadline, handle, _)| (*deadline, *handle));

        for (_, _, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, _, key)| key).collect()
    }
}
