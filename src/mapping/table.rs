//! Mapping table — at most one [`NoteMapping`] per MIDI note number.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::NoteMapping;

/// Registry of note mappings keyed by note number, iterated in ascending note order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    entries: BTreeMap<u8, NoteMapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly defaulted mapping for `note`, replacing any existing one wholly.
    ///
    /// Range configuration of a replaced entry is discarded, not merged.
    pub fn upsert(&mut self, note: u8, path: &str) -> &mut NoteMapping {
        let entry = NoteMapping::new(note, path);
        match self.entries.entry(note) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    /// Remove the mapping for `note`. Returns whether one existed.
    pub fn remove(&mut self, note: u8) -> bool {
        self.entries.remove(&note).is_some()
    }

    pub fn lookup(&self, note: u8) -> Option<&NoteMapping> {
        self.entries.get(&note)
    }

    pub fn lookup_mut(&mut self, note: u8) -> Option<&mut NoteMapping> {
        self.entries.get_mut(&note)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mappings in ascending note order.
    pub fn iter(&self) -> impl Iterator<Item = &NoteMapping> {
        self.entries.values()
    }
}
