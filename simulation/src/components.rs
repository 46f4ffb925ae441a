//! Identity and classification components shared by every animal in the herd.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identity Components
// ============================================================================

/// Herd-unique animal identifier. `AnimalId(0)` means "not yet assigned".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct AnimalId(pub u64);

impl AnimalId {
    pub const UNASSIGNED: AnimalId = AnimalId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

// ============================================================================
// Herd change bookkeeping
// ============================================================================

/// Why an animal is entering or leaving the herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HerdChangeReason {
    #[default]
    None,
    DiedUnderweight,
    DiedMortality,
    TradeSale,
    DryBreederSale,
    ExcessBreederSale,
    ExcessSireSale,
    MaxAgeSale,
    AgeWeightSale,
    ExcessPreBreederSale,
    Consumed,
    DestockSale,
    ReduceInitialHerd,
    MarkedSale,
    WeanerSale,
    Born,
    TradePurchase,
    BreederPurchase,
    SirePurchase,
    RestockPurchase,
    InitialHerd,
    FillInitialHerd,
}

impl HerdChangeReason {
    /// +1 for reasons that add to the herd, -1 for removals, 0 otherwise.
    pub fn population_change_direction(&self) -> i32 {
        use HerdChangeReason::*;
        match self {
            None => 0,
            DiedUnderweight | DiedMortality | TradeSale | DryBreederSale | ExcessBreederSale
            | ExcessSireSale | MaxAgeSale | AgeWeightSale | ExcessPreBreederSale | Consumed
            | DestockSale | ReduceInitialHerd | MarkedSale | WeanerSale => -1,
            Born | TradePurchase | BreederPurchase | SirePurchase | RestockPurchase
            | InitialHerd | FillInitialHerd => 1,
        }
    }

    pub fn is_death(&self) -> bool {
        matches!(self, HerdChangeReason::DiedUnderweight | HerdChangeReason::DiedMortality)
    }
}

/// Who drew milk from a lactating female.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilkUse {
    Suckling,
    Milked,
}

/// Reporting class of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnimalClass {
    Suckling,
    Weaner,
    PreBreeder,
    Heifer,
    Breeder,
    Sire,
    Castrate,
    Bull,
}

// ============================================================================
// Attributes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Inheritance {
    /// Attribute stays with the individual.
    #[default]
    None,
    /// Newborns receive the mother's value.
    Maternal,
}

/// A named genetic or phenotypic attribute carried by an individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub value: f64,
    #[serde(default)]
    pub inheritance: Inheritance,
}

// ============================================================================
// Calendar
// ============================================================================

/// Simulation clock. Each tick moves `step_months` calendar months forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub tick: u64,
    pub date: NaiveDate,
    pub step_months: u32,
}

impl Calendar {
    pub fn new(start: NaiveDate, step_months: u32) -> Self {
        Self {
            tick: 0,
            date: start,
            step_months: step_months.max(1),
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        if let Some(next) = self.date.checked_add_months(Months::new(self.step_months)) {
            self.date = next;
        }
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Length of one step in months.
    pub fn step_length(&self) -> f64 {
        self.step_months as f64
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_advances_by_months() {
        let mut cal = Calendar::new(NaiveDate::from_ymd_opt(2020, 11, 15).unwrap(), 1);
        cal.advance();
        assert_eq!(cal.month(), 12);
        cal.advance();
        assert_eq!(cal.month(), 1);
        assert_eq!(cal.year(), 2021);
        assert_eq!(cal.tick, 2);
    }

    #[test]
    fn test_change_direction() {
        assert_eq!(HerdChangeReason::Born.population_change_direction(), 1);
        assert_eq!(HerdChangeReason::WeanerSale.population_change_direction(), -1);
        assert_eq!(HerdChangeReason::None.population_change_direction(), 0);
        assert!(HerdChangeReason::DiedMortality.is_death());
        assert!(!HerdChangeReason::TradeSale.is_death());
    }

    #[test]
    fn test_unassigned_id() {
        assert!(!AnimalId::UNASSIGNED.is_assigned());
        assert!(AnimalId(3).is_assigned());
    }
}
