//! Notifications raised by the herd.
//!
//! The herd queues these as they happen; observers drain them with
//! [`crate::herd::Herd::take_events`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::components::{AnimalId, HerdChangeReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptionStatus {
    Conceived,
    Failed,
    Birth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Gain,
    Loss,
}

/// One individual entering or leaving the herd.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: u32,
    pub reason: HerdChangeReason,
    pub animal: AnimalId,
    pub herd_name: String,
    /// Name of whatever caused the change, e.g. "Breeding" or "Mortality".
    pub actor: String,
}

/// Lifetime breeding record of a female, reported once when she leaves the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedingStats {
    pub animal: AnimalId,
    pub herd_name: String,
    pub age: f64,
    pub number_of_conceptions: u32,
    pub number_of_births: u32,
    pub number_of_offspring: u32,
    pub number_of_weaned: u32,
    pub previous_conception_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HerdEvent {
    Transaction(Transaction),
    /// `offspring` is set on births, one event per newborn.
    ConceptionStatusChanged {
        animal: AnimalId,
        status: ConceptionStatus,
        offspring: Option<AnimalId>,
        date: NaiveDate,
    },
    WeanOccurred {
        animal: AnimalId,
        reason: String,
        date: NaiveDate,
    },
    FinalFemaleBreedingStats(BreedingStats),
}

impl HerdEvent {
    pub fn animal(&self) -> AnimalId {
        match self {
            HerdEvent::Transaction(transaction) => transaction.animal,
            HerdEvent::ConceptionStatusChanged { animal, .. } => *animal,
            HerdEvent::WeanOccurred { animal, .. } => *animal,
            HerdEvent::FinalFemaleBreedingStats(stats) => stats.animal,
        }
    }

    pub fn is_birth(&self) -> bool {
        matches!(
            self,
            HerdEvent::ConceptionStatusChanged {
                status: ConceptionStatus::Birth,
                ..
            }
        )
    }
}
