//! Birth System
//!
//! Fetal loss during pregnancy and delivery of pregnancies that reached term.

use tracing::debug;

use crate::components::Calendar;
use crate::error::Result;
use crate::herd::Herd;
use crate::random::RandomStream;

/// Apply per-step fetal mortality to every pregnant female.
/// Returns the number of pregnancies lost.
pub fn fetal_mortality_system(herd: &mut Herd, cal: &Calendar, rng: &mut RandomStream) -> Result<u32> {
    let pregnant: Vec<_> = herd
        .iter()
        .filter(|animal| animal.is_pregnant())
        .map(|animal| animal.id())
        .collect();

    let mut failed = 0;
    for id in pregnant {
        if herd
            .fetus_newborn_mortality(id, cal.step_length(), cal.date, rng)?
            .is_some()
        {
            failed += 1;
        }
    }
    Ok(failed)
}

/// Deliver every pregnancy that has reached gestation length.
/// Returns the number of newborns.
pub fn birth_system(herd: &mut Herd, cal: &Calendar) -> Result<u32> {
    let due: Vec<_> = herd
        .iter()
        .filter(|animal| animal.is_birth_due())
        .map(|animal| animal.id())
        .collect();

    let mut born = 0;
    for mother in due {
        born += herd.give_birth(mother, cal.date)?.len() as u32;
    }
    if born > 0 {
        debug!("{} births in {}", born, cal.date);
    }
    Ok(born)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::animal::Animal;
    use crate::components::Sex;
    use crate::config::BreedParameters;

    fn calendar() -> Calendar {
        Calendar::new(NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(), 1)
    }

    #[test]
    fn test_only_due_females_give_birth() {
        let mut rng = RandomStream::new(8);
        let params = Arc::new(BreedParameters::default());
        let mut herd = Herd::new();
        let due = herd.add_animal(Animal::new(Sex::Female, Arc::clone(&params), "herd", 50.0, 330.0), "test");
        let early = herd.add_animal(Animal::new(Sex::Female, params, "herd", 50.0, 330.0), "test");
        let cal = calendar();
        herd.conceive(due, 1, 1.0, -9.0, cal.date, &mut rng).unwrap();
        herd.conceive(early, 1, 1.0, -4.0, cal.date, &mut rng).unwrap();

        assert_eq!(birth_system(&mut herd, &cal).unwrap(), 1);
        assert!(!herd.get(due).unwrap().is_pregnant());
        assert!(herd.get(early).unwrap().is_pregnant());
        assert_eq!(herd.len(), 3);
    }

    #[test]
    fn test_certain_loss_ends_pregnancies() {
        let mut rng = RandomStream::new(8);
        let params = Arc::new(BreedParameters {
            prenatal_mortality: 1.0,
            gestation_length: 0.5,
            ..Default::default()
        });
        let mut herd = Herd::new();
        let cow = herd.add_animal(Animal::new(Sex::Female, params, "herd", 50.0, 330.0), "test");
        let cal = Calendar::new(NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(), 2);
        herd.conceive(cow, 1, 1.0, 0.0, cal.date, &mut rng).unwrap();

        assert_eq!(fetal_mortality_system(&mut herd, &cal, &mut rng).unwrap(), 1);
        assert!(!herd.get(cow).unwrap().is_pregnant());
    }
}
