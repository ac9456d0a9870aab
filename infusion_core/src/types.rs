//! Core domain types for the infusion conversion system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Dose and solute units
//! - Per-drug configuration records
//! - The catalog container

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Units
// ============================================================================

/// Unit in which a drug's dose rate is expressed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DoseUnit {
    #[serde(rename = "µg/kg/min")]
    McgPerKgPerMin,
    #[serde(rename = "µg/kg/hr")]
    McgPerKgPerHour,
    #[serde(rename = "mg/kg/hr")]
    MgPerKgPerHour,
    #[serde(rename = "mg/hr")]
    MgPerHour,
}

impl DoseUnit {
    pub const ALL: [DoseUnit; 4] = [
        DoseUnit::McgPerKgPerMin,
        DoseUnit::McgPerKgPerHour,
        DoseUnit::MgPerKgPerHour,
        DoseUnit::MgPerHour,
    ];

    /// Whether the dose is normalized by patient weight
    pub fn is_weight_based(self) -> bool {
        !matches!(self, DoseUnit::MgPerHour)
    }

    /// Micrograms per unit of the dose's mass scale
    pub fn mass_factor(self) -> f64 {
        match self {
            DoseUnit::McgPerKgPerMin | DoseUnit::McgPerKgPerHour => 1.0,
            DoseUnit::MgPerKgPerHour | DoseUnit::MgPerHour => 1000.0,
        }
    }

    /// Dose time periods per hour
    pub fn time_factor(self) -> f64 {
        match self {
            DoseUnit::McgPerKgPerMin => 60.0,
            _ => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DoseUnit::McgPerKgPerMin => "µg/kg/min",
            DoseUnit::McgPerKgPerHour => "µg/kg/hr",
            DoseUnit::MgPerKgPerHour => "mg/kg/hr",
            DoseUnit::MgPerHour => "mg/hr",
        }
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = Error;

    /// Accepts the µ form as well as the ASCII `ug`/`mcg` spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace("mcg", "µg")
            .replace("ug", "µg")
            .replace('μ', "µ");
        DoseUnit::ALL
            .into_iter()
            .find(|u| u.as_str() == normalized)
            .ok_or_else(|| Error::Config(format!("Unknown dose unit: {}", s)))
    }
}

/// Unit of the solute amount in a compounding recipe
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SoluteUnit {
    #[serde(rename = "mg")]
    Mg,
    #[serde(rename = "µg")]
    Mcg,
}

impl SoluteUnit {
    /// Micrograms per one unit
    pub fn micrograms(self) -> f64 {
        match self {
            SoluteUnit::Mg => 1000.0,
            SoluteUnit::Mcg => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoluteUnit::Mg => "mg",
            SoluteUnit::Mcg => "µg",
        }
    }
}

impl fmt::Display for SoluteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoluteUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mg" => Ok(SoluteUnit::Mg),
            "µg" | "μg" | "ug" | "mcg" => Ok(SoluteUnit::Mcg),
            other => Err(Error::Config(format!("Unknown solute unit: {}", other))),
        }
    }
}

// ============================================================================
// Drug Configuration
// ============================================================================

/// Full configuration of one continuous-infusion drug
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugConfig {
    pub label: String,
    pub dose_unit: DoseUnit,
    pub initial_dose: f64,
    pub solute_amount: f64,
    pub solute_unit: SoluteUnit,
    pub solution_volume: f64,
    pub dose_min: f64,
    pub dose_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danger_dose: Option<f64>,
    pub dose_step: f64,
    pub rate_step: f64,
    pub description: String,
    pub enabled: bool,
}

impl DrugConfig {
    /// Concentration of the compounded solution in µg/ml (NaN if the volume is not positive)
    pub fn concentration(&self) -> f64 {
        crate::conversion::compute_concentration(
            self.solute_amount,
            self.solute_unit,
            self.solution_volume,
        )
    }

    /// Whether `dose` reaches the danger threshold
    pub fn is_dangerous(&self, dose: f64) -> bool {
        self.danger_dose.is_some_and(|danger| dose >= danger)
    }

    /// List every rule this configuration breaks.
    ///
    /// Returns an empty Vec when the configuration is usable.
    pub fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let label = &self.label;

        if label.trim().is_empty() {
            errors.push("label is empty".to_string());
        }
        if !(self.dose_max > 0.0) {
            errors.push(format!("{}: maximum dose must be positive", label));
        }
        if !(self.dose_min >= 0.0) || self.dose_min > self.dose_max {
            errors.push(format!(
                "{}: minimum dose {} must be between 0 and the maximum {}",
                label, self.dose_min, self.dose_max
            ));
        }
        if !(self.initial_dose > 0.0) {
            errors.push(format!("{}: initial dose must be positive", label));
        }
        if self.initial_dose > self.dose_max {
            errors.push(format!(
                "{}: initial dose {} exceeds maximum {}",
                label, self.initial_dose, self.dose_max
            ));
        }
        if let Some(danger) = self.danger_dose {
            if !(danger > 0.0) {
                errors.push(format!("{}: danger threshold must be positive", label));
            }
            if danger > self.dose_max {
                errors.push(format!(
                    "{}: danger threshold {} exceeds maximum {}",
                    label, danger, self.dose_max
                ));
            }
        }
        if !(self.solute_amount > 0.0) {
            errors.push(format!("{}: solute amount must be positive", label));
        }
        if !(self.solution_volume > 0.0) {
            errors.push(format!("{}: solution volume must be positive", label));
        }
        if !(self.dose_step > 0.0) {
            errors.push(format!("{}: dose step must be positive", label));
        }
        if !(self.rate_step > 0.0) {
            errors.push(format!("{}: rate step must be positive", label));
        }

        errors
    }

    /// Validate before accepting an edited override
    pub fn validate(&self) -> Result<()> {
        match self.problems().into_iter().next() {
            None => Ok(()),
            Some(problem) => Err(Error::InvalidDrugConfig(problem)),
        }
    }
}

/// Current per-drug configuration keyed by drug identifier
pub type DrugConfigs = HashMap<String, DrugConfig>;

// ============================================================================
// Catalog Type
// ============================================================================

/// Built-in drug defaults together with their natural display order
#[derive(Clone, Debug)]
pub struct Catalog {
    pub order: Vec<String>,
    pub drugs: HashMap<String, DrugConfig>,
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&DrugConfig> {
        self.drugs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.drugs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers in their natural (shipped) order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// A fresh copy of every default, keyed by id
    pub fn default_configs(&self) -> DrugConfigs {
        self.drugs.clone()
    }
}
