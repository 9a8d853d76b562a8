//! Controller knobs — sixteen normalized values shared between the input side and the dispatcher.
//!
//! Each slot stores the `f32` bit pattern in an `AtomicU32`, so a reader never
//! sees a half-written value and neither side takes a lock.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::mapping::KNOB_COUNT;

/// Knob values captured at one instant, indexed `0..KNOB_COUNT`.
pub type ControllerSnapshot = [f32; KNOB_COUNT];

/// Read contract for controller values (host parameters, MIDI CCs, a UI).
pub trait ControllerSource: Send + Sync {
    /// Current value of knob `index`. Out-of-range indices read as `0.0`.
    fn value(&self, index: usize) -> f32;

    /// Read every knob once.
    fn snapshot(&self) -> ControllerSnapshot {
        let mut values = [0.0; KNOB_COUNT];
        for (index, value) in values.iter_mut().enumerate() {
            *value = self.value(index);
        }
        values
    }
}

/// Lock-free knob storage. All knobs start at `0.0`.
#[derive(Debug)]
pub struct Controls {
    knobs: [AtomicU32; KNOB_COUNT],
}

impl Controls {
    pub fn new() -> Self {
        Self {
            knobs: std::array::from_fn(|_| AtomicU32::new(0.0f32.to_bits())),
        }
    }

    /// Set knob `index`, clamped to `[0,1]`. Returns `false` for an out-of-range index.
    pub fn set(&self, index: usize, value: f32) -> bool {
        let Some(knob) = self.knobs.get(index) else {
            return false;
        };
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        knob.store(value.to_bits(), Ordering::Release);
        true
    }

    /// Set knob `index` from a 7-bit MIDI controller value.
    pub fn set_from_cc(&self, index: usize, value: u8) -> bool {
        self.set(index, f32::from(value.min(127)) / 127.0)
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerSource for Controls {
    fn value(&self, index: usize) -> f32 {
        self.knobs
            .get(index)
            .map(|knob| f32::from_bits(knob.load(Ordering::Acquire)))
            .unwrap_or(0.0)
    }
}
