// src/cache.rs

use crate::model::{CacheKey, CountVector, DocumentKey};
use dashmap::DashMap;
use tracing::trace;

/// Count vectors keyed by repository root, path and revision.
///
/// Entries are never expired; a new revision simply produces a new key.
/// A stored vector whose length no longer matches the document is a miss.
#[derive(Debug, Default)]
pub struct RevisionCache {
    entries: DashMap<CacheKey, CountVector>,
}

impl RevisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey, line_count: usize) -> Option<CountVector> {
        let entry = self.entries.get(key)?;
        if entry.len() != line_count {
            trace!(
                "cache length drift for {}: stored {}, wanted {line_count}",
                key.as_str(),
                entry.len()
            );
            return None;
        }
        trace!("cache hit for {}", key.as_str());
        Some(entry.value().clone())
    }

    /// Stores a private copy of `counts`.
    pub fn put(&self, key: CacheKey, counts: &[u32]) {
        self.entries.insert(key, CountVector::from(counts));
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Last-known counts per open document, so cursor movement can reuse them
/// without going back to history. Callers drop an entry whenever the
/// document's text changes.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: DashMap<DocumentKey, CountVector>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for `doc`, unless its line count has drifted since they were stored
    pub fn get(&self, doc: &DocumentKey, line_count: usize) -> Option<CountVector> {
        self.entries
            .get(doc)
            .filter(|counts| counts.len() == line_count)
            .map(|counts| counts.value().clone())
    }

    pub fn set(&self, doc: DocumentKey, counts: CountVector) {
        self.entries.insert(doc, counts);
    }

    pub fn delete(&self, doc: &DocumentKey) {
        self.entries.remove(doc);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
