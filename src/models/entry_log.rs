// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Append-only log of annotation entries.
//!
//! Entries keep insertion order for both display and export. Removal is by
//! id and never reorders what remains. Several entries may share a frame.

use super::annotation::{Entry, EntryId, NativeCoords};

/// Insertion-ordered collection of [`Entry`] values.
#[derive(Debug, Clone, Default)]
pub struct EntryLog {
    entries: Vec<Entry>,
}

impl EntryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new entry at the end of the log.
    pub fn append(&mut self, frame: u64, coords: NativeCoords) -> EntryId {
        let id = EntryId::next();
        self.entries.push(Entry { id, frame, coords });
        log::info!(
            "Logged frame {} box {}, total entries: {}",
            frame,
            coords,
            self.entries.len()
        );
        id
    }

    /// Remove the entry with `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: EntryId) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            let removed = self.entries.remove(pos);
            log::info!(
                "Removed entry for frame {}, total entries: {}",
                removed.frame,
                self.entries.len()
            );
        } else {
            log::debug!("Entry {:?} already gone", id);
        }
    }

    pub fn list(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Frame that selecting `entry` should navigate to.
    pub fn seek_target(entry: &Entry) -> u64 {
        entry.frame
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Only used when the session is torn down.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(n: u32) -> NativeCoords {
        NativeCoords {
            x1: n,
            y1: n,
            x2: n + 10,
            y2: n + 10,
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = EntryLog::new();
        log.append(30, coords(1));
        log.append(10, coords(2));
        log.append(20, coords(3));

        let frames: Vec<u64> = log.list().iter().map(|e| e.frame).collect();
        assert_eq!(frames, vec![30, 10, 20]);
    }

    #[test]
    fn test_remove_present_id() {
        let mut log = EntryLog::new();
        let a = log.append(1, coords(1));
        let b = log.append(2, coords(2));
        let c = log.append(3, coords(3));

        log.remove(b);

        assert_eq!(log.len(), 2);
        let ids: Vec<EntryId> = log.list().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut log = EntryLog::new();
        let a = log.append(1, coords(1));
        log.remove(a);
        log.remove(a);
        log.remove(EntryId::next());
        assert!(log.is_empty());
    }

    #[test]
    fn test_duplicate_frames_are_independent() {
        let mut log = EntryLog::new();
        let first = log.append(42, coords(1));
        let second = log.append(42, coords(5));

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(first).unwrap().coords, coords(1));
        assert_eq!(log.get(second).unwrap().coords, coords(5));

        log.remove(first);
        assert_eq!(log.len(), 1);
        assert_eq!(log.list()[0].id, second);
        assert_eq!(log.list()[0].frame, 42);
    }

    #[test]
    fn test_seek_target() {
        let mut log = EntryLog::new();
        let id = log.append(77, coords(0));
        assert_eq!(EntryLog::seek_target(log.get(id).unwrap()), 77);
    }
}
