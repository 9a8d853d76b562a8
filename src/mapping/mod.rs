//! Note mappings — what a single MIDI note sends when it is triggered.

pub mod table;

pub use table::MappingTable;

use crate::range::ValueRange;

/// Number of controller knobs available to every mapping.
pub const KNOB_COUNT: usize = 16;

/// Highest valid MIDI note number.
pub const MAX_NOTE: u8 = 127;

/// Per-note OSC configuration: destination path, argument flags, ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteMapping {
    note: u8,
    path: String,
    pub use_note: bool,
    pub use_velocity: bool,
    pub random_range: ValueRange,
    pub knob_ranges: [ValueRange; KNOB_COUNT],
}

impl NoteMapping {
    /// Create a freshly defaulted mapping. The path is prefixed with `/` if needed.
    pub fn new(note: u8, path: &str) -> Self {
        Self {
            note,
            path: normalize_path(path),
            use_note: true,
            use_velocity: true,
            random_range: ValueRange::default(),
            knob_ranges: [ValueRange::default(); KNOB_COUNT],
        }
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    /// OSC address, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = normalize_path(path);
    }

    /// Mark a knob as contributing an argument. Out-of-range indices are ignored.
    pub fn use_knob(&mut self, index: usize) {
        if let Some(range) = self.knob_ranges.get_mut(index) {
            range.in_use = true;
        }
    }

    /// Stop sending a knob's value. Out-of-range indices are ignored.
    pub fn release_knob(&mut self, index: usize) {
        if let Some(range) = self.knob_ranges.get_mut(index) {
            range.in_use = false;
        }
    }

    pub fn is_using_knob(&self, index: usize) -> bool {
        self.knob_ranges.get(index).is_some_and(|r| r.in_use)
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
