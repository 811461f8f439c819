//! Registered streams and their per-follower sync records.
//!
//! Entries live in a slot arena indexed by stream id. A stream is either fully
//! present (handle plus sync record) or absent; removal frees the slot for
//! reuse.

use std::collections::HashMap;

use crate::error::SyncError;
use crate::stream::{StreamHandle, StreamId};
use crate::sync::FollowerSync;

/// One registered stream.
#[derive(Debug)]
pub struct StreamEntry {
    pub handle: StreamHandle,
    pub sync: FollowerSync,
}

#[derive(Debug, Default)]
pub struct StreamRegistry {
    slots: Vec<Option<StreamEntry>>,
    index: HashMap<StreamId, usize>,
    free: Vec<usize>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream. Identifiers must be unique.
    pub fn insert(&mut self, handle: StreamHandle) -> Result<(), SyncError> {
        if self.index.contains_key(handle.id()) {
            return Err(SyncError::DuplicateStream(handle.id().clone()));
        }
        let id = handle.id().clone();
        let entry = StreamEntry {
            handle,
            sync: FollowerSync::default(),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        Ok(())
    }

    pub fn remove(&mut self, id: &StreamId) -> Option<StreamEntry> {
        let slot = self.index.remove(id)?;
        let entry = self.slots.get_mut(slot).and_then(Option::take);
        self.free.push(slot);
        entry
    }

    pub fn get(&self, id: &StreamId) -> Option<&StreamEntry> {
        let slot = *self.index.get(id)?;
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: &StreamId) -> Option<&mut StreamEntry> {
        let slot = *self.index.get(id)?;
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: &StreamId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered ids in arena order (not meaningful for election).
    pub fn ids(&self) -> impl Iterator<Item = &StreamId> {
        self.entries().map(|entry| entry.handle.id())
    }

    pub fn entries(&self) -> impl Iterator<Item = &StreamEntry> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut StreamEntry> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// `(id, duration)` pairs with unknown durations reported as 0.
    pub fn durations(&self) -> impl Iterator<Item = (&StreamId, f64)> {
        self.entries()
            .map(|entry| (entry.handle.id(), entry.handle.duration()))
    }

    /// Longest known duration, 0 if none is known.
    pub fn max_duration(&self) -> f64 {
        self.durations()
            .map(|(_, duration)| duration)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStream;

    fn handle(id: &str, duration: f64) -> StreamHandle {
        StreamHandle::new(StreamId::from(id), Box::new(FakeStream::new(duration)))
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = StreamRegistry::new();
        registry.insert(handle("stream-0", 10.0)).expect("insert");
        let err = registry.insert(handle("stream-0", 20.0)).expect_err("dup");
        assert!(matches!(err, SyncError::DuplicateStream(_)));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .get(&StreamId::from("stream-0"))
                .map(|e| e.handle.duration()),
            Some(10.0)
        );
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut registry = StreamRegistry::new();
        registry.insert(handle("stream-0", 10.0)).expect("insert");
        registry.insert(handle("stream-1", 20.0)).expect("insert");
        let removed = registry.remove(&StreamId::from("stream-0")).expect("present");
        assert_eq!(removed.handle.id().as_str(), "stream-0");
        assert!(!registry.contains(&StreamId::from("stream-0")));

        registry.insert(handle("stream-2", 30.0)).expect("insert");
        assert_eq!(registry.slots.len(), 2);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&StreamId::from("stream-2")).is_some());
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut registry = StreamRegistry::new();
        assert!(registry.remove(&StreamId::from("ghost")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn max_duration_ignores_unknown() {
        let mut registry = StreamRegistry::new();
        assert_eq!(registry.max_duration(), 0.0);
        registry
            .insert(StreamHandle::new(
                StreamId::from("stream-0"),
                Box::new(FakeStream::unloaded()),
            ))
            .expect("insert");
        registry.insert(handle("stream-1", 61.5)).expect("insert");
        assert_eq!(registry.max_duration(), 61.5);
    }
}
