//! Error types for the herd engine.
//!
//! Biological edge cases (no fetuses, no milk, zero intake) are never errors.
//! Only configuration problems and structural misuse surface here.

use thiserror::Error;

use crate::components::{AnimalId, Sex};

#[derive(Error, Debug)]
pub enum HerdError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Animal not found: {0:?}")]
    AnimalNotFound(AnimalId),

    #[error("Animal {id:?} is not {expected:?}")]
    WrongSex { id: AnimalId, expected: Sex },

    #[error("Animal {0:?} is already pregnant")]
    AlreadyPregnant(AnimalId),

    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HerdError>;
