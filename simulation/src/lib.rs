//! Herd Simulation Engine
//!
//! Individual-based livestock herd model: each animal ages, grows, breeds and
//! lactates, and the herd manager tracks who exists, who mothers whom and why
//! animals come and go. Runs single-threaded and is reproducible from its seed.

pub mod animal;
pub mod cohorts;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod female;
pub mod herd;
pub mod random;
pub mod systems;
pub mod world;

pub use animal::{Animal, AnimalKind, MaleState};
pub use cohorts::InitialHerdReport;
pub use components::*;
pub use config::{BreedConfig, BreedParameters, CohortSpec, HerdConfig, DAYS_PER_MONTH};
pub use error::{HerdError, Result};
pub use events::{BreedingStats, ConceptionStatus, HerdEvent, Transaction, TransactionKind};
pub use female::{FemaleState, Milk};
pub use herd::{ClassSummary, Herd};
pub use random::RandomStream;
pub use systems::{ConceptionModel, FixedConceptionRate};
pub use world::{HerdSimulation, TickResult};
