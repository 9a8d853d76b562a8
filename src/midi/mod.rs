//! MIDI side of the bridge — parsing, the note-on event buffer, device input.

pub mod config;
pub mod events;
pub mod input;
pub mod message;

pub use config::MidiConfig;
pub use events::{EventBuffer, NoteEvent};
pub use input::MidiInput;
pub use message::{parse_midi_message, MidiInputEvent};
