//! Concentration and dose-rate/flow-rate conversion.
//!
//! Every function here is pure. Invalid inputs (non-positive weight or
//! volume) produce `f64::NAN` rather than an error so the value can flow
//! through further arithmetic; callers check with `f64::is_nan`.

use crate::policy::round_to_step;
use crate::types::{DoseUnit, SoluteUnit};

/// Concentration in µg/ml of `amount` (in `unit`) dissolved to `volume` ml.
///
/// Returns NaN when `volume` is not positive. No rounding is applied.
pub fn compute_concentration(amount: f64, unit: SoluteUnit, volume: f64) -> f64 {
    if !(volume > 0.0) {
        return f64::NAN;
    }
    amount * unit.micrograms() / volume
}

/// Weight factor for a unit, or None when a required weight is not positive
fn weight_factor(weight: f64, unit: DoseUnit) -> Option<f64> {
    if !unit.is_weight_based() {
        return Some(1.0);
    }
    if weight > 0.0 {
        Some(weight)
    } else {
        None
    }
}

/// Convert a dose in `unit` to a pump flow rate in ml/hr.
///
/// `mg/hr` ignores `weight`; the weight-based units return NaN for `weight <= 0`.
pub fn dose_to_rate(dose: f64, weight: f64, concentration: f64, unit: DoseUnit) -> f64 {
    let Some(weight) = weight_factor(weight, unit) else {
        return f64::NAN;
    };
    let micrograms_per_hour = dose * weight * unit.mass_factor() * unit.time_factor();
    micrograms_per_hour / concentration
}

/// Convert a pump flow rate in ml/hr back to a dose in `unit`.
///
/// Exact inverse of [`dose_to_rate`].
pub fn rate_to_dose(rate: f64, weight: f64, concentration: f64, unit: DoseUnit) -> f64 {
    let Some(weight) = weight_factor(weight, unit) else {
        return f64::NAN;
    };
    let micrograms_per_hour = rate * concentration;
    micrograms_per_hour / (unit.mass_factor() * unit.time_factor()) / weight
}

/// Flow-rate range implied by a dose range, each end rounded to `rate_step`
pub fn rate_bounds(
    dose_min: f64,
    dose_max: f64,
    weight: f64,
    concentration: f64,
    unit: DoseUnit,
    rate_step: f64,
) -> (f64, f64) {
    (
        round_to_step(dose_to_rate(dose_min, weight, concentration, unit), rate_step),
        round_to_step(dose_to_rate(dose_max, weight, concentration, unit), rate_step),
    )
}

/// Human-readable recipe, e.g. `5 mg / 50 ml`
pub fn format_composition(amount: f64, unit: SoluteUnit, volume: f64) -> String {
    format!("{} {} / {} ml", amount, unit, volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_concentration_from_mg() {
        assert_eq!(compute_concentration(5.0, SoluteUnit::Mg, 50.0), 100.0);
    }

    #[test]
    fn test_concentration_from_mcg() {
        assert_eq!(compute_concentration(200.0, SoluteUnit::Mcg, 50.0), 4.0);
    }

    #[test]
    fn test_concentration_non_positive_volume_is_nan() {
        for unit in [SoluteUnit::Mg, SoluteUnit::Mcg] {
            assert!(compute_concentration(5.0, unit, 0.0).is_nan());
            assert!(compute_concentration(5.0, unit, -10.0).is_nan());
        }
    }

    #[test]
    fn test_norepinephrine_scenario() {
        let concentration = compute_concentration(5.0, SoluteUnit::Mg, 50.0);
        let rate = dose_to_rate(0.1, 50.0, concentration, DoseUnit::McgPerKgPerMin);
        assert!(close(rate, 3.0), "rate was {}", rate);

        let dose = rate_to_dose(3.0, 50.0, concentration, DoseUnit::McgPerKgPerMin);
        assert!(close(dose, 0.1), "dose was {}", dose);
    }

    #[test]
    fn test_per_unit_formulas() {
        let c = 100.0;
        assert!(close(dose_to_rate(0.03, 50.0, c, DoseUnit::McgPerKgPerMin), 0.9));
        assert!(close(dose_to_rate(2.0, 50.0, c, DoseUnit::McgPerKgPerHour), 1.0));
        assert!(close(dose_to_rate(2.0, 50.0, c, DoseUnit::MgPerKgPerHour), 1000.0));
        assert!(close(dose_to_rate(2.0, 50.0, c, DoseUnit::MgPerHour), 20.0));
    }

    #[test]
    fn test_round_trip_all_units() {
        let weights = [0.5, 3.2, 50.0, 120.0];
        let concentrations = [1.0, 4.0, 100.0, 6000.0];
        let doses = [0.0, 0.01, 0.375, 7.0, 40.0];

        for unit in DoseUnit::ALL {
            for &w in &weights {
                for &c in &concentrations {
                    for &d in &doses {
                        let back = rate_to_dose(dose_to_rate(d, w, c, unit), w, c, unit);
                        assert!(
                            close(back, d),
                            "{} w={} c={} d={} came back as {}",
                            unit,
                            w,
                            c,
                            d,
                            back
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_non_positive_weight_is_nan() {
        for unit in [
            DoseUnit::McgPerKgPerMin,
            DoseUnit::McgPerKgPerHour,
            DoseUnit::MgPerKgPerHour,
        ] {
            for w in [0.0, -5.0] {
                assert!(dose_to_rate(0.1, w, 100.0, unit).is_nan());
                assert!(rate_to_dose(3.0, w, 100.0, unit).is_nan());
            }
        }
    }

    #[test]
    fn test_mg_per_hour_ignores_weight() {
        let a = dose_to_rate(2.0, 40.0, 100.0, DoseUnit::MgPerHour);
        let b = dose_to_rate(2.0, 90.0, 100.0, DoseUnit::MgPerHour);
        assert_eq!(a, b);
        assert!(!dose_to_rate(2.0, 0.0, 100.0, DoseUnit::MgPerHour).is_nan());
        assert!(close(rate_to_dose(20.0, -1.0, 100.0, DoseUnit::MgPerHour), 2.0));
    }

    #[test]
    fn test_nan_concentration_propagates() {
        let c = compute_concentration(5.0, SoluteUnit::Mg, 0.0);
        assert!(dose_to_rate(0.1, 50.0, c, DoseUnit::McgPerKgPerMin).is_nan());
    }

    #[test]
    fn test_rate_bounds() {
        let (min, max) = rate_bounds(0.0, 0.3, 50.0, 100.0, DoseUnit::McgPerKgPerMin, 0.1);
        assert!(close(min, 0.0));
        assert!(close(max, 9.0));
    }

    #[test]
    fn test_format_composition() {
        assert_eq!(format_composition(5.0, SoluteUnit::Mg, 50.0), "5 mg / 50 ml");
        assert_eq!(format_composition(200.0, SoluteUnit::Mcg, 50.0), "200 µg / 50 ml");
        assert_eq!(format_composition(2.5, SoluteUnit::Mg, 25.0), "2.5 mg / 25 ml");
    }
}
