//! Deferred callbacks as data.
//!
//! The scheduler never calls anything itself. Owners schedule an action value,
//! then drain due actions with [`Scheduler::pop_due`] inside their own tick and
//! dispatch them with full `&mut self` access. Cancelled handles are dropped
//! lazily when they reach the top of the heap.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct PendingTimer<T> {
    fire_at_ms: u64,
    interval_ms: Option<u64>,
    action: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    queue: BinaryHeap<Reverse<(u64, u64)>>,
    pending: HashMap<u64, PendingTimer<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule_once(&mut self, delay_ms: u64, action: T) -> TimerHandle {
        self.insert(delay_ms, None, action)
    }

    /// Fires every `interval_ms` until cancelled. A zero interval is treated as 1 ms.
    pub fn schedule_repeating(&mut self, interval_ms: u64, action: T) -> TimerHandle {
        let interval = interval_ms.max(1);
        self.insert(interval, Some(interval), action)
    }

    fn insert(&mut self, delay_ms: u64, interval_ms: Option<u64>, action: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let fire_at_ms = self.now_ms.saturating_add(delay_ms);
        self.queue.push(Reverse((fire_at_ms, id)));
        self.pending.insert(
            id,
            PendingTimer {
                fire_at_ms,
                interval_ms,
                action,
            },
        );
        TimerHandle(id)
    }

    /// Returns true if the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle.0).is_some()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle.0)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Milliseconds until `handle` fires, if it is still pending.
    pub fn remaining_ms(&self, handle: TimerHandle) -> Option<u64> {
        self.pending
            .get(&handle.0)
            .map(|timer| timer.fire_at_ms.saturating_sub(self.now_ms))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_to(&mut self, target_ms: u64) {
        if target_ms > self.now_ms {
            self.now_ms = target_ms;
        }
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pops the earliest timer due at or before `until_ms`, moving the clock to
    /// its fire time. Timers with equal fire times pop in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerHandle, T)> {
        while let Some(Reverse((fire_at_ms, id))) = self.queue.peek().copied() {
            if fire_at_ms > until_ms {
                return None;
            }
            self.queue.pop();

            let Some(timer) = self.pending.get(&id) else {
                continue; // cancelled
            };
            if timer.fire_at_ms != fire_at_ms {
                continue;
            }

            self.now_ms = self.now_ms.max(fire_at_ms);
            let action = timer.action.clone();
            match timer.interval_ms {
                Some(interval) => {
                    let next = fire_at_ms.saturating_add(interval);
                    if let Some(timer) = self.pending.get_mut(&id) {
                        timer.fire_at_ms = next;
                    }
                    self.queue.push(Reverse((next, id)));
                }
                None => {
                    self.pending.remove(&id);
                }
            }
            return Some((TimerHandle(id), action));
        }
        None
    }

    /// Convenience for owners that need no interleaving: advances by
    /// `delta_ms` and returns everything that fired, in order.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<(TimerHandle, T)> {
        let target = self.now_ms.saturating_add(delta_ms);
        let mut fired = Vec::new();
        while let Some(entry) = self.pop_due(target) {
            fired.push(entry);
        }
        self.advance_to(target);
        fired
    }
}
