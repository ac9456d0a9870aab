//! Configuration file support for infuse.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/infuse/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub patient: PatientConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Patient weight input bounds (kg)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PatientConfig {
    #[serde(default = "default_weight")]
    pub default_weight: f64,

    #[serde(default = "default_weight_min")]
    pub weight_min: f64,

    #[serde(default = "default_weight_max")]
    pub weight_max: f64,

    #[serde(default = "default_weight_step")]
    pub weight_step: f64,
}

impl Default for PatientConfig {
    fn default() -> Self {
        Self {
            default_weight: default_weight(),
            weight_min: default_weight_min(),
            weight_max: default_weight_max(),
            weight_step: default_weight_step(),
        }
    }
}

/// Accepted concentration range for edited recipes (µg/ml)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    #[serde(default = "default_concentration_min")]
    pub concentration_min: f64,

    #[serde(default = "default_concentration_max")]
    pub concentration_max: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            concentration_min: default_concentration_min(),
            concentration_max: default_concentration_max(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("infuse")
}

fn default_weight() -> f64 {
    50.0
}

fn default_weight_min() -> f64 {
    20.0
}

fn default_weight_max() -> f64 {
    120.0
}

fn default_weight_step() -> f64 {
    1.0
}

fn default_concentration_min() -> f64 {
    1.0
}

fn default_concentration_max() -> f64 {
    10000.0
}

impl AppConfig {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("infuse").join("config.toml")
    }

    /// Reject bounds that would make every input out of range
    pub fn validate(&self) -> Result<()> {
        let p = &self.patient;
        if !(p.weight_min > 0.0) || p.weight_min > p.weight_max {
            return Err(Error::Config(format!(
                "weight range {}-{} kg is invalid",
                p.weight_min, p.weight_max
            )));
        }
        if p.default_weight < p.weight_min || p.default_weight > p.weight_max {
            return Err(Error::Config(format!(
                "default weight {} kg is outside {}-{} kg",
                p.default_weight, p.weight_min, p.weight_max
            )));
        }
        if !(p.weight_step > 0.0) {
            return Err(Error::Config("weight step must be positive".into()));
        }
        let l = &self.limits;
        if !(l.concentration_min > 0.0) || l.concentration_min > l.concentration_max {
            return Err(Error::Config(format!(
                "concentration range {}-{} µg/ml is invalid",
                l.concentration_min, l.concentration_max
            )));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.patient.default_weight, 50.0);
        assert_eq!(config.patient.weight_min, 20.0);
        assert_eq!(config.patient.weight_max, 120.0);
        assert_eq!(config.limits.concentration_max, 10000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("infuse/config.toml");

        let mut config = AppConfig::default();
        config.patient.default_weight = 70.0;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.patient, config.patient);
        assert_eq!(loaded.limits, config.limits);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[patient]
weight_max = 150.0
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.patient.weight_max, 150.0);
        assert_eq!(config.patient.weight_min, 20.0); // default
        assert_eq!(config.limits.concentration_min, 1.0); // default
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[patient]\nweight_min = 130.0\n").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(Error::Config(_))));
    }
}
