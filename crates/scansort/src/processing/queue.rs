//! FIFO queue of uploaded filenames awaiting routing

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Unbounded FIFO of original filenames. Producers are upload handlers;
/// the single worker is the only consumer.
#[derive(Default)]
pub struct WorkQueue {
    entries: Mutex<VecDeque<String>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filename to the back of the queue
    pub fn push(&self, original_filename: impl Into<String>) {
        self.entries.lock().push_back(original_filename.into());
    }

    /// Take the oldest entry, if any
    pub fn pop(&self) -> Option<String> {
        self.entries.lock().pop_front()
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
