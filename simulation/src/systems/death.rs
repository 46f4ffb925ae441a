//! Death System
//!
//! Base mortality: each animal dies with the breed's annual mortality rate
//! converted to the step length.

use tracing::debug;

use crate::components::{Calendar, HerdChangeReason};
use crate::error::Result;
use crate::herd::Herd;
use crate::random::RandomStream;

/// Convert an annual probability to one for `step_months`: 1 - (1 - annual)^(step/12)
pub fn step_mortality_rate(annual: f64, step_months: f64) -> f64 {
    1.0 - (1.0 - annual.clamp(0.0, 1.0)).powf(step_months / 12.0)
}

/// Remove animals that die this step. Returns the number of deaths.
pub fn death_system(herd: &mut Herd, cal: &Calendar, rng: &mut RandomStream) -> Result<u32> {
    let mut deaths = Vec::new();

    // Determine who dies this tick
    for animal in herd.iter() {
        let rate = step_mortality_rate(animal.params().mortality_base, cal.step_length());
        if rng.chance(rate) {
            deaths.push(animal.id());
        }
    }

    let count = deaths.len() as u32;
    for id in deaths {
        if let Some(animal) = herd.get_mut(id) {
            animal.sale_flag = HerdChangeReason::DiedMortality;
        }
        herd.remove_animal(id, "Mortality")?;
    }
    if count > 0 {
        debug!("{} deaths in {}", count, cal.date);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::animal::Animal;
    use crate::components::Sex;
    use crate::config::BreedParameters;

    #[test]
    fn test_mortality_rates() {
        let monthly = step_mortality_rate(0.12, 1.0);
        assert!(monthly > 0.0 && monthly < 0.12 / 12.0 + 1e-3);
        assert!((step_mortality_rate(0.12, 12.0) - 0.12).abs() < 1e-12);
        assert_eq!(step_mortality_rate(0.0, 1.0), 0.0);
        assert!(step_mortality_rate(0.3, 3.0) > step_mortality_rate(0.3, 1.0));
    }

    #[test]
    fn test_certain_death_removes_everyone() {
        let params = Arc::new(BreedParameters {
            mortality_base: 1.0,
            ..Default::default()
        });
        let mut herd = Herd::new();
        for _ in 0..3 {
            herd.add_animal(Animal::new(Sex::Female, Arc::clone(&params), "herd", 30.0, 300.0), "test");
        }
        let cal = Calendar::new(NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(), 1);
        let mut rng = RandomStream::new(5);
        assert_eq!(death_system(&mut herd, &cal, &mut rng).unwrap(), 3);
        assert!(herd.is_empty());
    }
}
