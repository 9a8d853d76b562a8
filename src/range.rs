//! Value ranges — linear maps from a normalized `[0,1]` input to an output interval.
//!
//! A range either produces a float, or in integer mode a 1-based integer
//! (`floor(mapped) + 1`) so that a range of `0..8` yields values `1..=8`
//! (with `9` only at the exact upper endpoint).

use rosc::OscType;

/// Output of evaluating a [`ValueRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeValue {
    Float(f32),
    Int(i32),
}

impl RangeValue {
    /// The OSC argument carrying this value (float32 or int32).
    pub fn to_osc(self) -> OscType {
        match self {
            RangeValue::Float(v) => OscType::Float(v),
            RangeValue::Int(v) => OscType::Int(v),
        }
    }
}

/// A configurable output interval. `lo > hi` is valid and reverses direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub in_use: bool,
    pub is_integer: bool,
    pub lo: f32,
    pub hi: f32,
}

impl ValueRange {
    pub fn new(lo: f32, hi: f32) -> Self {
        Self {
            lo,
            hi,
            ..Self::default()
        }
    }

    /// Linear interpolation `lo + t * (hi - lo)`. Input is not clamped.
    pub fn map(&self, t: f32) -> f32 {
        self.lo + t * (self.hi - self.lo)
    }

    /// Map `t` and quantize when the range is in integer mode.
    ///
    /// Integer results saturate at the `i32` bounds; NaN quantizes to `1`.
    pub fn evaluate(&self, t: f32) -> RangeValue {
        let mapped = self.map(t);
        if self.is_integer {
            RangeValue::Int((mapped.floor() as i32).saturating_add(1))
        } else {
            RangeValue::Float(mapped)
        }
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self {
            in_use: false,
            is_integer: false,
            lo: 0.0,
            hi: 1.0,
        }
    }
}
