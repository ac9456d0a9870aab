//! User-facing notices.
//!
//! Non-fatal conditions (a clamped value, a rejected recipe, a failed write)
//! are reported as notices rather than errors. Their `Display` text is what
//! the UI shows.

use crate::policy::Bound;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// A value was clamped into its configured range
    OutOfRange {
        quantity: String,
        min: f64,
        max: f64,
        unit: String,
        bound: Bound,
    },
    /// A recipe produced a concentration outside the accepted range
    InvalidConcentration { min: f64, max: f64 },
    /// An entered value was not a finite number and was ignored
    InvalidInput { quantity: String },
    /// Writing a key to the persistence collaborator failed
    PersistenceFailed { key: String, message: String },
    /// Reading persisted settings failed; defaults are in use
    LoadFailed { message: String },
    /// A drug's settings were restored to the shipped defaults
    ResetDone { drug: String },
}

impl Notice {
    pub fn out_of_range(
        quantity: impl Into<String>,
        min: f64,
        max: f64,
        unit: impl Into<String>,
        bound: Bound,
    ) -> Self {
        Notice::OutOfRange {
            quantity: quantity.into(),
            min,
            max,
            unit: unit.into(),
            bound,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::OutOfRange {
                quantity,
                min,
                max,
                unit,
                bound,
            } => {
                let side = match bound {
                    Bound::Min => "raised to the minimum",
                    Bound::Max => "lowered to the maximum",
                };
                write!(
                    f,
                    "{} must be within {}\u{2013}{} {} ({})",
                    quantity, min, max, unit, side
                )
            }
            Notice::InvalidConcentration { min, max } => {
                write!(f, "Concentration must be within {}\u{2013}{} µg/ml", min, max)
            }
            Notice::InvalidInput { quantity } => write!(f, "{} must be a number", quantity),
            Notice::PersistenceFailed { key, message } => {
                write!(f, "Failed to save settings ({}): {}", key, message)
            }
            Notice::LoadFailed { message } => {
                write!(f, "Failed to load settings, using defaults: {}", message)
            }
            Notice::ResetDone { drug } => write!(f, "{} restored to defaults", drug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_names_the_bound() {
        let notice = Notice::out_of_range("Dose", 0.0, 0.3, "µg/kg/min", Bound::Max);
        let text = notice.to_string();
        assert!(text.starts_with("Dose must be within 0\u{2013}0.3 µg/kg/min"));
        assert!(text.contains("maximum"));
    }

    #[test]
    fn test_invalid_input_text() {
        let notice = Notice::InvalidInput {
            quantity: "Weight".into(),
        };
        assert_eq!(notice.to_string(), "Weight must be a number");
    }

    #[test]
    fn test_persistence_failed_text() {
        let notice = Notice::PersistenceFailed {
            key: "drug_order".into(),
            message: "disk full".into(),
        };
        assert_eq!(
            notice.to_string(),
            "Failed to save settings (drug_order): disk full"
        );
    }
}
