//! Best-effort progress reporting for concurrent work.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Counts completed items and logs roughly every tenth of the total.
///
/// Only used for observability; nothing waits on it.
#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    total: usize,
    step: usize,
    done: AtomicUsize,
}

impl Progress {
    pub fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            step: (total / 10).max(1),
            done: AtomicUsize::new(0),
        }
    }

    /// Record one completed item and return the number completed so far.
    pub fn tick(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.step == 0 || done == self.total {
            info!("{}: {done}/{}", self.label, self.total);
        }

        done
    }
}
