//! Staging area for fetched-but-not-yet-rendered entries.
//!
//! Entries arrive in whatever order the sources answered.  Before any batch
//! leaves the buffer it is sorted newest-first across all sources, so no
//! source is privileged by arrival order.

use crate::source::Entry;

#[derive(Debug, Default)]
pub struct EntryBuffer {
    entries: Vec<Entry>,
    /// Set whenever entries were appended since the last sort.
    dirty: bool,
}

impl EntryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fetch result.  Order is restored by [`sort`](Self::sort) or
    /// lazily by [`take_batch`](Self::take_batch).
    pub fn extend(&mut self, entries: impl IntoIterator<Item = Entry>) {
        let before = self.entries.len();
        self.entries.extend(entries);
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    pub fn sort(&mut self) {
        if self.dirty {
            // Stable, so equal timestamps keep arrival order.
            self.entries.sort_by(Entry::newest_first);
            self.dirty = false;
        }
    }

    /// Remove up to `max` of the newest entries.
    pub fn take_batch(&mut self, max: usize) -> Vec<Entry> {
        self.sort();
        let n = max.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].dt >= w[1].dt)
    }
}
