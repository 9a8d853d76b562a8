//! MIDI message parsing — raw bytes to the inputs the bridge reacts to.

/// A MIDI input the bridge cares about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiInputEvent {
    /// Note-on with velocity normalized to `[0,1]`.
    NoteOn { note: u8, velocity: f32 },
    /// Control change, raw 7-bit value.
    ControlChange { controller: u8, value: u8 },
}

/// Parse a raw MIDI message.
///
/// MIDI message format:
/// - Note On:  [0x90 | channel, note, velocity]
/// - CC:       [0xB0 | channel, cc_number, value]
///
/// Note-off, and note-on with velocity 0, produce nothing.
pub fn parse_midi_message(msg: &[u8], channel_filter: Option<u8>) -> Option<MidiInputEvent> {
    let (&status_byte, data) = msg.split_first()?;
    let status = status_byte & 0xF0;
    let channel = status_byte & 0x0F;

    if let Some(filter) = channel_filter {
        if channel != filter {
            return None;
        }
    }

    match (status, data) {
        (0x90, &[note, velocity, ..]) if velocity > 0 => Some(MidiInputEvent::NoteOn {
            note: note & 0x7F,
            velocity: f32::from(velocity & 0x7F) / 127.0,
        }),
        (0xB0, &[controller, value, ..]) => Some(MidiInputEvent::ControlChange {
            controller: controller & 0x7F,
            value: value & 0x7F,
        }),
        _ => None,
    }
}
