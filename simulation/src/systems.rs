//! Per-step herd systems.
//!
//! Each system makes one pass over the herd and returns how many animals it
//! changed. [`crate::world::HerdSimulation::tick`] runs them in a fixed order.

pub mod aging;
pub mod birth;
pub mod breeding;
pub mod death;
pub mod weaning;

pub use aging::aging_system;
pub use birth::{birth_system, fetal_mortality_system};
pub use breeding::{breeding_system, ConceptionModel, FixedConceptionRate};
pub use death::death_system;
pub use weaning::weaning_system;
