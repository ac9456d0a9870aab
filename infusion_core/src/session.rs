//! Interactive conversion state for one drug.
//!
//! An [`InfusionSession`] is the transient edit buffer behind a converter
//! screen: it holds the weight, recipe, dose and flow rate for a single
//! drug and keeps them consistent. Every setter rounds to the configured
//! step, clamps into range and returns the notices raised on the way.
//! Nothing here is persisted; a changed recipe reaches the store only
//! through [`InfusionSession::to_config`] and an explicit update.

use crate::config::AppConfig;
use crate::conversion::{
    compute_concentration, dose_to_rate, format_composition, rate_bounds, rate_to_dose,
};
use crate::notice::Notice;
use crate::policy::{clamp, constrain, Clamped};
use crate::types::{DoseUnit, DrugConfig, SoluteUnit};

const WEIGHT_UNIT: &str = "kg";
const RATE_UNIT: &str = "ml/hr";

#[derive(Clone, Debug)]
pub struct InfusionSession {
    drug_id: String,
    config: DrugConfig,
    weight_min: f64,
    weight_max: f64,
    weight_step: f64,
    concentration_min: f64,
    concentration_max: f64,
    weight: f64,
    solute_amount: f64,
    solute_unit: SoluteUnit,
    solution_volume: f64,
    concentration: f64,
    dose: f64,
    rate: f64,
}

impl InfusionSession {
    /// Start a session at the drug's initial dose and the configured default weight
    pub fn new(drug_id: impl Into<String>, config: DrugConfig, app: &AppConfig) -> Self {
        let dose = clamp(config.initial_dose, config.dose_min, config.dose_max).value;
        let mut session = Self {
            drug_id: drug_id.into(),
            weight_min: app.patient.weight_min,
            weight_max: app.patient.weight_max,
            weight_step: app.patient.weight_step,
            concentration_min: app.limits.concentration_min,
            concentration_max: app.limits.concentration_max,
            weight: app.patient.default_weight,
            solute_amount: config.solute_amount,
            solute_unit: config.solute_unit,
            solution_volume: config.solution_volume,
            concentration: config.concentration(),
            dose,
            rate: 0.0,
            config,
        };
        session.rate = session.derive_rate().value;
        tracing::debug!(
            "Session for '{}': dose {} {}, rate {} ml/hr",
            session.drug_id,
            session.dose,
            session.config.dose_unit,
            session.rate
        );
        session
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn drug_id(&self) -> &str {
        &self.drug_id
    }

    pub fn config(&self) -> &DrugConfig {
        &self.config
    }

    pub fn dose_unit(&self) -> DoseUnit {
        self.config.dose_unit
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn dose(&self) -> f64 {
        self.dose
    }

    /// Flow rate in ml/hr
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Concentration in µg/ml
    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn composition(&self) -> String {
        format_composition(self.solute_amount, self.solute_unit, self.solution_volume)
    }

    /// Flow-rate range implied by the dose range at the current weight and concentration
    pub fn rate_range(&self) -> (f64, f64) {
        rate_bounds(
            self.config.dose_min,
            self.config.dose_max,
            self.weight,
            self.concentration,
            self.config.dose_unit,
            self.config.rate_step,
        )
    }

    pub fn is_dangerous(&self) -> bool {
        self.config.is_dangerous(self.dose)
    }

    /// The drug config with this session's recipe, ready to commit to the store
    pub fn to_config(&self) -> DrugConfig {
        DrugConfig {
            solute_amount: self.solute_amount,
            solute_unit: self.solute_unit,
            solution_volume: self.solution_volume,
            ..self.config.clone()
        }
    }

    // ========================================================================
    // Edits
    // ========================================================================

    // Setters ignore non-finite input with an `InvalidInput` notice.

    pub fn set_weight(&mut self, weight: f64) -> Vec<Notice> {
        if !weight.is_finite() {
            return vec![invalid_input("Weight")];
        }
        let mut notices = Vec::new();
        let (min, max) = (self.weight_min, self.weight_max);
        let clamped = constrain(weight, self.weight_step, min, max);
        self.weight = self.accept(clamped, "Weight", min, max, WEIGHT_UNIT, &mut notices);

        let rate = self.derive_rate();
        self.rate = self.accept_rate(rate, &mut notices);
        notices
    }

    pub fn set_dose(&mut self, dose: f64) -> Vec<Notice> {
        if !dose.is_finite() {
            return vec![invalid_input("Dose")];
        }
        let mut notices = Vec::new();
        let (min, max) = (self.config.dose_min, self.config.dose_max);
        let clamped = constrain(dose, self.config.dose_step, min, max);
        let unit = self.config.dose_unit.as_str();
        self.dose = self.accept(clamped, "Dose", min, max, unit, &mut notices);

        let rate = self.derive_rate();
        self.rate = self.accept_rate(rate, &mut notices);
        notices
    }

    pub fn set_rate(&mut self, rate: f64) -> Vec<Notice> {
        if !rate.is_finite() {
            return vec![invalid_input("Flow rate")];
        }
        let mut notices = Vec::new();
        let (rate_min, rate_max) = self.rate_range();
        let clamped = constrain(rate, self.config.rate_step, rate_min, rate_max);
        self.rate = self.accept_rate(clamped, &mut notices);

        let (min, max) = (self.config.dose_min, self.config.dose_max);
        let raw = rate_to_dose(self.rate, self.weight, self.concentration, self.config.dose_unit);
        let clamped = constrain(raw, self.config.dose_step, min, max);
        let unit = self.config.dose_unit.as_str();
        self.dose = self.accept(clamped, "Dose", min, max, unit, &mut notices);
        notices
    }

    /// Change the compounding recipe.
    ///
    /// A recipe whose concentration is undefined or outside the accepted
    /// range is rejected and leaves the session unchanged.
    pub fn set_recipe(&mut self, amount: f64, unit: SoluteUnit, volume: f64) -> Vec<Notice> {
        let concentration = compute_concentration(amount, unit, volume);
        if concentration.is_nan()
            || concentration < self.concentration_min
            || concentration > self.concentration_max
        {
            tracing::debug!("Rejected recipe {} {} / {} ml", amount, unit, volume);
            return vec![Notice::InvalidConcentration {
                min: self.concentration_min,
                max: self.concentration_max,
            }];
        }

        self.solute_amount = amount;
        self.solute_unit = unit;
        self.solution_volume = volume;
        self.concentration = concentration;

        let mut notices = Vec::new();
        let rate = self.derive_rate();
        self.rate = self.accept_rate(rate, &mut notices);
        notices
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Rate for the current dose, rounded and clamped to the rate range
    fn derive_rate(&self) -> Clamped {
        let (min, max) = self.rate_range();
        let raw = dose_to_rate(self.dose, self.weight, self.concentration, self.config.dose_unit);
        constrain(raw, self.config.rate_step, min, max)
    }

    fn accept_rate(&self, clamped: Clamped, notices: &mut Vec<Notice>) -> f64 {
        let (min, max) = self.rate_range();
        self.accept(clamped, "Flow rate", min, max, RATE_UNIT, notices)
    }

    fn accept(
        &self,
        clamped: Clamped,
        quantity: &str,
        min: f64,
        max: f64,
        unit: &str,
        notices: &mut Vec<Notice>,
    ) -> f64 {
        if let Some(bound) = clamped.violated {
            notices.push(Notice::out_of_range(quantity, min, max, unit, bound));
        }
        clamped.value
    }
}

fn invalid_input(quantity: &str) -> Notice {
    tracing::debug!("Ignored non-finite {}", quantity.to_lowercase());
    Notice::InvalidInput {
        quantity: quantity.to_string(),
    }
}
