//! Per-file outline cache
//!
//! Keeps the outline of every file that has been fully scanned during the
//! provider's lifetime, so repeated activations skip the outline service.
//! Chunks of a file still in flight are staged and only become visible as a
//! cache entry once the final chunk arrived.

use std::collections::HashMap;

use crate::outline::OutlineItem;
use crate::workspace::FileId;

#[derive(Debug, Default)]
pub struct OutlineCache {
    /// Completed outlines
    entries: HashMap<FileId, Vec<OutlineItem>>,
    /// Chunks received for files whose outline has not completed yet
    pending: HashMap<FileId, Vec<OutlineItem>>,
}

impl OutlineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed outline for a file, if any
    pub fn get(&self, file: FileId) -> Option<&[OutlineItem]> {
        self.entries.get(&file).map(Vec::as_slice)
    }

    pub fn contains(&self, file: FileId) -> bool {
        self.entries.contains_key(&file)
    }

    /// Stage a chunk of a file whose outline is still being computed
    pub fn stage(&mut self, file: FileId, items: &[OutlineItem]) {
        self.pending
            .entry(file)
            .or_default()
            .extend_from_slice(items);
    }

    /// Promote the staged chunks of a file to a cache entry
    ///
    /// Returns the number of cached items. A file that already has an entry
    /// keeps it.
    pub fn commit(&mut self, file: FileId) -> usize {
        let staged = self.pending.remove(&file).unwrap_or_default();
        if let Some(existing) = self.entries.get(&file) {
            tracing::debug!(
                "Outline for {} already cached, dropping {} staged items",
                file,
                staged.len()
            );
            return existing.len();
        }
        let count = staged.len();
        self.entries.insert(file, staged);
        count
    }

    /// Forget staged chunks of a file whose outline will not complete
    pub fn discard_pending(&mut self, file: FileId) {
        self.pending.remove(&file);
    }

    /// Drop everything known about a file (e.g. it was closed)
    pub fn evict(&mut self, file: FileId) -> bool {
        self.pending.remove(&file);
        self.entries.remove(&file).is_some()
    }

    /// Number of files with a completed outline
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
