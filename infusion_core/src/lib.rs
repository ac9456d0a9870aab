#![forbid(unsafe_code)]

//! Core conversion engine and drug configuration model for continuous infusions.
//!
//! This crate provides:
//! - Domain types (dose units, solute units, drug configs)
//! - Concentration and dose-rate/flow-rate conversion
//! - Range/step policy with user-facing notices
//! - The built-in drug catalog
//! - A persisted configuration overlay with ordering and reset semantics

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod conversion;
pub mod policy;
pub mod notice;
pub mod storage;
pub mod store;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::AppConfig;
pub use conversion::{
    compute_concentration, dose_to_rate, format_composition, rate_bounds, rate_to_dose,
};
pub use policy::{clamp, round_to_step, Clamped};
pub use notice::Notice;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ConfigStore, StoreEvent, StoreState};
pub use session::InfusionSession;
