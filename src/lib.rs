//! midiosc — a real-time bridge from MIDI notes and controller knobs to per-note OSC messages.

pub mod bridge;
pub mod controls;
pub mod dispatch;
pub mod error;
pub mod mapping;
pub mod midi;
pub mod osc;
pub mod range;
pub mod state;

pub use bridge::Bridge;
pub use error::{Error, Result};
