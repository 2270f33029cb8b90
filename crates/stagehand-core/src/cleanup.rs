//! Deferred removal of state owned by pages that are no longer active.
//!
//! Keys are queued when a page is left and removed only when
//! [`CleanupScheduler::process`] runs at the end of a pass, after the newly
//! active page has written its own state. Writing a queued key in the
//! meantime reclaims it.

use indexmap::IndexSet;

use crate::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPhase {
    #[default]
    Idle,
    Queued,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Keys deleted from the session store.
    pub removed: Vec<String>,
    /// Queued keys that had already disappeared from the store.
    pub missing: Vec<String>,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.missing.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CleanupScheduler {
    queue: IndexSet<String>,
    reclaimed: u64,
}

impl CleanupScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CleanupPhase {
        if self.queue.is_empty() {
            CleanupPhase::Idle
        } else {
            CleanupPhase::Queued
        }
    }

    /// Queues every stored key matching one of `prefixes`. Returns how many
    /// keys were newly queued.
    pub fn enqueue<S: AsRef<str>>(&mut self, prefixes: &[S], state: &SessionState) -> usize {
        let before = self.queue.len();
        for prefix in prefixes {
            for key in state.keys_with_prefix(prefix.as_ref()) {
                self.queue.insert(key);
            }
        }
        self.queue.len() - before
    }

    /// Takes `key` back out of the queue because it is being written again.
    pub fn reclaim(&mut self, key: &str) -> bool {
        let reclaimed = self.queue.shift_remove(key);
        if reclaimed {
            self.reclaimed += 1;
            log::trace!("reclaimed `{key}` from cleanup");
        }
        reclaimed
    }

    /// Deletes every still-queued key. Idempotent on an empty queue.
    pub fn process(&mut self, state: &mut SessionState) -> CleanupReport {
        let mut report = CleanupReport::default();
        for key in self.queue.drain(..) {
            if state.remove(&key) {
                report.removed.push(key);
            } else {
                report.missing.push(key);
            }
        }
        report
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn is_queued(&self, key: &str) -> bool {
        self.queue.contains(key)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Forgets the queue without touching the store.
    pub fn clear(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        count
    }

    /// Total keys rescued by [`reclaim`](Self::reclaim) over the session.
    pub fn reclaimed_count(&self) -> u64 {
        self.reclaimed
    }
}

#[cfg(test)]
#[path = "tests/cleanup_tests.rs"]
mod tests;
