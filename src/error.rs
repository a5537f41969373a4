//! Errors raised for malformed data reaching the calculator

use thiserror::Error;

use crate::models::TypeId;

#[derive(Debug, Error, PartialEq)]
pub enum HarvestError {
    #[error("ore type {ore_type_id} has an invalid fraction {fraction}")]
    InvalidFraction { ore_type_id: TypeId, fraction: f64 },

    #[error("hourly harvest volume must be finite, got {0}")]
    InvalidVolume(f64),

    #[error("reprocess yield must be a finite value of at most 1.0, got {0}")]
    InvalidYield(f64),

    #[error("ore type {0} has no usable unit volume or portion size")]
    InvalidOreType(TypeId),

    #[error("material type {0} is not in the material catalog")]
    UnknownMaterial(TypeId),

    #[error("tag name {0:?} must be 1 to 20 characters")]
    InvalidTag(String),

    #[error("invalid asset line {line:?}: {reason}")]
    InvalidAsset { line: String, reason: String },
}

pub type Result<T> = std::result::Result<T, HarvestError>;
