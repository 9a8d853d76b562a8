//! Event buffer — note-ons collected between dispatch ticks.
//!
//! Producers append from any thread; the dispatcher drains the whole buffer
//! under the same lock, so an event is seen by exactly one tick.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A note-on waiting for the next dispatch tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note: u8,
    /// Normalized velocity, `raw / 127`.
    pub velocity: f32,
}

/// Append-only accumulator of note-on events, drained atomically.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Mutex<Vec<NoteEvent>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Duplicates are kept.
    pub fn push(&self, event: NoteEvent) {
        self.lock().push(event);
    }

    /// Take every buffered event in arrival order, leaving the buffer empty.
    pub fn drain(&self) -> Vec<NoteEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<NoteEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
