//! # Entry Store
//! Append-only, time-ordered in-memory collection of columns for the current
//! process lifetime (optionally reset each day).
//!
//! Dedup is enforced at insertion: membership check and append happen under
//! one lock, and range reads take a consistent snapshot under the same lock.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Mutex;

use crate::entry::Entry;

/// Thread-safe store of entries keyed by dedup id.
#[derive(Debug, Default)]
pub struct EntryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order == timestamp order.
    entries: Vec<Entry>,
    ids: HashSet<String>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` unless its id is already stored. Returns the stored
    /// entry, or `None` for a duplicate.
    ///
    /// A timestamp older than the newest stored one is raised to it, so the
    /// collection stays ordered by time.
    pub fn insert(&self, mut entry: Entry) -> Option<Entry> {
        let mut inner = self.inner.lock().expect("entry store mutex poisoned");
        if inner.ids.contains(&entry.id) {
            return None;
        }
        if let Some(last) = inner.entries.last() {
            if entry.timestamp < last.timestamp {
                entry.timestamp = last.timestamp;
            }
        }
        inner.ids.insert(entry.id.clone());
        inner.entries.push(entry.clone());
        Some(entry)
    }

    pub fn contains(&self, id: &str) -> bool {
        let inner = self.inner.lock().expect("entry store mutex poisoned");
        inner.ids.contains(id)
    }

    /// Entries with `start <= timestamp <= end`, in insertion order.
    pub fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Entry> {
        if start > end {
            return Vec::new();
        }
        let inner = self.inner.lock().expect("entry store mutex poisoned");
        let from = inner.entries.partition_point(|e| e.timestamp < start);
        let to = inner.entries.partition_point(|e| e.timestamp <= end);
        inner.entries[from..to].to_vec()
    }

    /// Copy of every stored entry.
    pub fn snapshot(&self) -> Vec<Entry> {
        let inner = self.inner.lock().expect("entry store mutex poisoned");
        inner.entries.clone()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("entry store mutex poisoned");
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything (new reporting day).
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("entry store mutex poisoned");
        inner.entries.clear();
        inner.ids.clear();
    }
}
