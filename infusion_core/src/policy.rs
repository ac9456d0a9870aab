//! Range/step policy.
//!
//! New values are rounded to their step first, then clamped into the
//! configured range. The clamped value is what gets committed; the
//! violated bound (if any) is reported so the caller can tell the user.

/// Which end of a range was violated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

/// Result of clamping a value into `[min, max]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clamped {
    pub value: f64,
    pub violated: Option<Bound>,
}

impl Clamped {
    pub fn was_out_of_range(&self) -> bool {
        self.violated.is_some()
    }

    /// `(clamped_value, was_out_of_range)`
    pub fn into_pair(self) -> (f64, bool) {
        (self.value, self.was_out_of_range())
    }
}

/// Round `value` to the nearest multiple of `step` (halves round away from zero).
///
/// A non-positive `step` leaves the value untouched; NaN stays NaN.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if !(step > 0.0) || !value.is_finite() {
        return value;
    }
    let multiples = (value / step).round();
    let reciprocal = 1.0 / step;
    // Dividing by an integral reciprocal keeps decimal steps exact (0.13, not 0.13000000000000003)
    if reciprocal >= 1.0 && (reciprocal - reciprocal.round()).abs() < 1e-9 {
        multiples / reciprocal.round()
    } else {
        multiples * step
    }
}

/// Clamp `value` into `[min, max]`, recording which bound was crossed.
///
/// NaN is passed through unclamped and never reported as out of range.
pub fn clamp(value: f64, min: f64, max: f64) -> Clamped {
    if value < min {
        Clamped {
            value: min,
            violated: Some(Bound::Min),
        }
    } else if value > max {
        Clamped {
            value: max,
            violated: Some(Bound::Max),
        }
    } else {
        Clamped {
            value,
            violated: None,
        }
    }
}

/// Round to `step`, then clamp into `[min, max]`
pub fn constrain(value: f64, step: f64, min: f64, max: f64) -> Clamped {
    clamp(round_to_step(value, step), min, max)
}
