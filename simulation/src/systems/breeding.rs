//! Breeding System
//!
//! Natural mating: females able to breed conceive when a breeding sire runs in
//! the same herd. The conception rate comes from a pluggable model.

use std::collections::BTreeSet;

use crate::animal::Animal;
use crate::components::{Calendar, Sex};
use crate::error::Result;
use crate::herd::Herd;
use crate::random::RandomStream;

/// Supplies the probability that a female conceives this step.
pub trait ConceptionModel {
    fn conception_rate(&self, female: &Animal) -> f64;
}

/// The same rate for every female.
#[derive(Debug, Clone, Copy)]
pub struct FixedConceptionRate {
    pub rate: f64,
}

impl FixedConceptionRate {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }
}

impl ConceptionModel for FixedConceptionRate {
    fn conception_rate(&self, _female: &Animal) -> f64 {
        self.rate
    }
}

/// Returns the number of conceptions.
pub fn breeding_system(
    herd: &mut Herd,
    cal: &Calendar,
    model: &dyn ConceptionModel,
    rng: &mut RandomStream,
) -> Result<u32> {
    let herds_with_sires: BTreeSet<String> = herd
        .iter()
        .filter(|animal| animal.sex() == Sex::Male && animal.is_able_to_breed())
        .map(|animal| animal.herd_name().to_string())
        .collect();
    if herds_with_sires.is_empty() {
        return Ok(0);
    }

    let mut conceptions = 0;
    for id in herd.ids() {
        let outcome = {
            let Some(animal) = herd.get(id) else {
                continue;
            };
            if animal.sex() != Sex::Female
                || !animal.is_able_to_breed()
                || !animal.is_within_mating_age()
                || !herds_with_sires.contains(animal.herd_name())
            {
                continue;
            }
            let rate = model.conception_rate(&animal);
            if rng.chance(rate) {
                Some((rate, animal.number_of_offspring_this_pregnancy(rng)))
            } else {
                None
            }
        };

        if let Some((rate, number)) = outcome {
            herd.conceive(id, number, rate, 0.0, cal.date, rng)?;
            conceptions += 1;
        }
    }
    Ok(conceptions)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::BreedParameters;

    fn setup(with_sire: bool) -> (Herd, Vec<crate::components::AnimalId>) {
        let params = Arc::new(BreedParameters::default());
        let mut herd = Herd::new();
        let cows = (0..4)
            .map(|_| herd.add_animal(Animal::new(Sex::Female, Arc::clone(&params), "herd", 40.0, 330.0), "test"))
            .collect();
        let mut bull = Animal::new(Sex::Male, params, "herd", 48.0, 600.0);
        if let Some(male) = bull.male_mut() {
            male.breeding_sire = with_sire;
        }
        herd.add_animal(bull, "test");
        (herd, cows)
    }

    fn calendar() -> Calendar {
        Calendar::new(NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(), 1)
    }

    #[test]
    fn test_certain_conception_with_sire() {
        let (mut herd, cows) = setup(true);
        let mut rng = RandomStream::new(2);
        let n = breeding_system(&mut herd, &calendar(), &FixedConceptionRate::new(1.0), &mut rng).unwrap();
        assert_eq!(n, 4);
        assert!(cows.iter().all(|id| herd.get(*id).unwrap().is_pregnant()));

        // Already pregnant females are skipped next step.
        let again = breeding_system(&mut herd, &calendar(), &FixedConceptionRate::new(1.0), &mut rng).unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_no_sire_no_conception() {
        let (mut herd, cows) = setup(false);
        let mut rng = RandomStream::new(2);
        let n = breeding_system(&mut herd, &calendar(), &FixedConceptionRate::new(1.0), &mut rng).unwrap();
        assert_eq!(n, 0);
        assert!(cows.iter().all(|id| !herd.get(*id).unwrap().is_pregnant()));
    }

    #[test]
    fn test_zero_rate_never_conceives() {
        let (mut herd, _) = setup(true);
        let mut rng = RandomStream::new(2);
        let n = breeding_system(&mut herd, &calendar(), &FixedConceptionRate::new(0.0), &mut rng).unwrap();
        assert_eq!(n, 0);
    }
}
