//! Default catalog of continuous-infusion drugs.
//!
//! This module provides the built-in drug table. Entries are never mutated;
//! user edits live in the configuration overlay (see [`crate::store`]).

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn build_default_catalog_internal() -> Catalog {
    let entries: Vec<(&str, DrugConfig)> = vec![
        // ====================================================================
        // Vasopressors and inotropes
        // ====================================================================
        (
            "norepinephrine",
            DrugConfig {
                label: "Norepinephrine".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 0.03,
                solute_amount: 5.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 0.0,
                dose_max: 0.3,
                danger_dose: Some(0.2),
                dose_step: 0.01,
                rate_step: 0.1,
                description: "Usually 0.01-0.2 µg/kg/min, though higher doses may be required. \
                              Titrate against serial blood pressure measurements."
                    .into(),
                enabled: true,
            },
        ),
        (
            "dopamine",
            DrugConfig {
                label: "Dopamine".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 5.0,
                solute_amount: 600.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 200.0,
                dose_min: 0.0,
                dose_max: 20.0,
                danger_dose: Some(15.0),
                dose_step: 0.1,
                rate_step: 1.0,
                description: "Typical starting dose for circulatory support is 3-5 µg/kg/min, \
                              adjusted to cardiac output, blood pressure, heart rate and urine \
                              output. May be increased to 20 µg/kg/min; above 8-10 µg/kg/min \
                              vascular resistance rises, so consider combining agents."
                    .into(),
                enabled: true,
            },
        ),
        (
            "dexmedetomidine",
            DrugConfig {
                label: "Dexmedetomidine".into(),
                dose_unit: DoseUnit::McgPerKgPerHour,
                initial_dose: 0.2,
                solute_amount: 200.0,
                solute_unit: SoluteUnit::Mcg,
                solution_volume: 50.0,
                dose_min: 0.0,
                dose_max: 1.2,
                danger_dose: Some(0.7),
                dose_step: 0.01,
                rate_step: 0.1,
                description: "A loading dose is not usually given. Maintenance is 0.2-0.7 \
                              µg/kg/hr, though some patients need more to reach the target \
                              sedation level."
                    .into(),
                enabled: true,
            },
        ),
        // ====================================================================
        // Analgesics, anaesthetics and neuromuscular blockers
        // ====================================================================
        (
            "fentanyl",
            DrugConfig {
                label: "Fentanyl".into(),
                dose_unit: DoseUnit::McgPerKgPerHour,
                initial_dose: 1.0,
                solute_amount: 1000.0,
                solute_unit: SoluteUnit::Mcg,
                solution_volume: 100.0,
                dose_min: 0.0,
                dose_max: 6.0,
                danger_dose: Some(4.0),
                dose_step: 0.1,
                rate_step: 0.1,
                description: "Postoperative analgesia usually starts at 1-2 µg/kg/hr and is \
                              titrated within 0.5-5 µg/kg/hr, watching for respiratory \
                              depression and bradycardia. High doses can cause chest wall \
                              rigidity."
                    .into(),
                enabled: true,
            },
        ),
        (
            "remifentanil",
            DrugConfig {
                label: "Remifentanil".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 0.25,
                solute_amount: 2.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 20.0,
                dose_min: 0.0,
                dose_max: 1.0,
                danger_dose: Some(0.8),
                dose_step: 0.01,
                rate_step: 0.1,
                description: "Anaesthesia maintenance starts at 0.25-0.5 µg/kg/min and is \
                              adjusted within 0.05-1 µg/kg/min. Effect ends quickly after \
                              stopping, so prepare postoperative analgesia in advance."
                    .into(),
                enabled: true,
            },
        ),
        (
            "propofol",
            DrugConfig {
                label: "Propofol".into(),
                dose_unit: DoseUnit::MgPerKgPerHour,
                initial_dose: 4.0,
                solute_amount: 500.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 0.5,
                dose_max: 10.0,
                danger_dose: Some(8.0),
                dose_step: 0.1,
                rate_step: 0.1,
                description: "Anaesthesia maintenance is usually 4-10 mg/kg/hr; ICU sedation \
                              under ventilation 0.5-3 mg/kg/hr. Monitor blood pressure every 5 \
                              minutes and SpO2 continuously."
                    .into(),
                enabled: true,
            },
        ),
        (
            "rocuronium",
            DrugConfig {
                label: "Rocuronium".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 7.0,
                solute_amount: 500.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 3.0,
                dose_max: 16.0,
                danger_dose: Some(12.0),
                dose_step: 0.5,
                rate_step: 0.1,
                description: "Start the infusion at 7 µg/kg/min and adjust within 3-16 \
                              µg/kg/min guided by neuromuscular monitoring (TOF, PTC). \
                              Sugammadex is the first-line reversal agent."
                    .into(),
                enabled: true,
            },
        ),
        (
            "dobutamine",
            DrugConfig {
                label: "Dobutamine".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 5.0,
                solute_amount: 250.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 2.0,
                dose_max: 20.0,
                danger_dose: Some(15.0),
                dose_step: 0.5,
                rate_step: 0.1,
                description: "Inotrope that raises cardiac output. Adjust within 2-20 \
                              µg/kg/min; watch for tachycardia and arrhythmia at high doses."
                    .into(),
                enabled: true,
            },
        ),
        // ====================================================================
        // Vasodilators, vasoconstrictors and rate control
        // ====================================================================
        (
            "nicardipine",
            DrugConfig {
                label: "Nicardipine".into(),
                dose_unit: DoseUnit::MgPerHour,
                initial_dose: 5.0,
                solute_amount: 25.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 25.0,
                dose_min: 2.5,
                dose_max: 15.0,
                danger_dose: Some(10.0),
                dose_step: 0.5,
                rate_step: 0.1,
                description: "First-line calcium channel blocker for continuous blood pressure \
                              control. Start at 5 mg/hr and increase by 2.5 mg/hr every 5-15 \
                              minutes. Change peripheral lines every 12 hours."
                    .into(),
                enabled: true,
            },
        ),
        (
            "nitroglycerin",
            DrugConfig {
                label: "Nitroglycerin".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 0.5,
                solute_amount: 50.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 0.25,
                dose_max: 5.0,
                danger_dose: Some(3.0),
                dose_step: 0.05,
                rate_step: 0.1,
                description: "Reduces preload and increases coronary flow. Titrate within \
                              0.25-5 µg/kg/min every 3-5 minutes; watch for hypotension and \
                              headache."
                    .into(),
                enabled: true,
            },
        ),
        (
            "phenylephrine",
            DrugConfig {
                label: "Phenylephrine".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 0.5,
                solute_amount: 10.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 0.1,
                dose_max: 3.0,
                danger_dose: Some(2.0),
                dose_step: 0.05,
                rate_step: 0.1,
                description: "Pure alpha agonist that raises blood pressure. Aim for 0.1-3 \
                              µg/kg/min; excess causes peripheral ischaemia and reflex \
                              bradycardia."
                    .into(),
                enabled: true,
            },
        ),
        (
            "milrinone",
            DrugConfig {
                label: "Milrinone".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 0.375,
                solute_amount: 50.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 0.25,
                dose_max: 1.0,
                danger_dose: Some(0.75),
                dose_step: 0.05,
                rate_step: 0.1,
                description: "PDE III inhibitor with inotropic and vasodilating effects. \
                              0.25-0.75 µg/kg/min; watch for hypotension and arrhythmia and \
                              adjust for renal function."
                    .into(),
                enabled: true,
            },
        ),
        (
            "landiolol",
            DrugConfig {
                label: "Landiolol".into(),
                dose_unit: DoseUnit::McgPerKgPerMin,
                initial_dose: 3.0,
                solute_amount: 300.0,
                solute_unit: SoluteUnit::Mg,
                solution_volume: 50.0,
                dose_min: 1.0,
                dose_max: 40.0,
                danger_dose: Some(20.0),
                dose_step: 0.5,
                rate_step: 0.1,
                description: "Ultra-short-acting beta-1 blocker for tachyarrhythmia and rate \
                              control, titrated within 1-40 µg/kg/min. Effect wears off about 4 \
                              minutes after stopping."
                    .into(),
                enabled: true,
            },
        ),
    ];

    let mut order = Vec::with_capacity(entries.len());
    let mut drugs = HashMap::with_capacity(entries.len());
    for (id, config) in entries {
        order.push(id.to_string());
        drugs.insert(id.to_string(), config);
    }

    Catalog { order, drugs }
}

impl Catalog {
    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.order.is_empty() {
            errors.push("Catalog has no drugs".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for id in &self.order {
            if id.is_empty() {
                errors.push("Drug has empty ID".to_string());
            }
            if !seen.insert(id.as_str()) {
                errors.push(format!("Drug '{}' appears twice in the natural order", id));
            }
            if !self.drugs.contains_key(id) {
                errors.push(format!("Drug '{}' is ordered but has no configuration", id));
            }
        }

        for (id, config) in &self.drugs {
            if !seen.contains(id.as_str()) {
                errors.push(format!("Drug '{}' is missing from the natural order", id));
            }
            if config.dose_min > config.initial_dose {
                errors.push(format!(
                    "Drug '{}': initial dose {} < min {}",
                    id, config.initial_dose, config.dose_min
                ));
            }
            errors.extend(
                config
                    .problems()
                    .into_iter()
                    .map(|problem| format!("Drug '{}': {}", id, problem)),
            );
        }

        errors
    }

    /// [`Catalog::validate`] as a `Result`, logging every problem found
    pub fn ensure_valid(&self) -> crate::Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            tracing::error!("Catalog validation: {}", error);
        }
        Err(crate::Error::CatalogValidation(format!(
            "{} problem(s), first: {}",
            errors.len(),
            errors[0]
        )))
    }

    /// Check that `order` names every catalog drug exactly once
    pub fn check_permutation(&self, order: &[String]) -> crate::Result<()> {
        if order.len() != self.order.len() {
            return Err(crate::Error::InvalidOrder(format!(
                "expected {} drugs, got {}",
                self.order.len(),
                order.len()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for id in order {
            if !self.contains(id) {
                return Err(crate::Error::InvalidOrder(format!("unknown drug '{}'", id)));
            }
            if !seen.insert(id.as_str()) {
                return Err(crate::Error::InvalidOrder(format!("drug '{}' listed twice", id)));
            }
        }

        Ok(())
    }
}
