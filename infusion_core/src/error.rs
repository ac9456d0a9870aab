//! Error types for the infusion_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for infusion_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// A drug order that is not a permutation of the catalog
    #[error("Invalid drug order: {0}")]
    InvalidOrder(String),

    /// Drug identifier not present in the catalog
    #[error("Unknown drug: {0}")]
    UnknownDrug(String),

    /// A per-drug override failed validation
    #[error("Invalid drug configuration: {0}")]
    InvalidDrugConfig(String),

    /// Key-value persistence failure
    #[error("Persistence error for '{key}': {message}")]
    Persistence { key: String, message: String },
}
