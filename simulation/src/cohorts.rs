//! Initial herd construction.
//!
//! Configured cohorts become live animals, then every unweaned animal is paired
//! with a breeding female and the remaining breeders get a plausible breeding
//! history back-dated from their age.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::animal::Animal;
use crate::components::{AnimalId, HerdChangeReason, Sex};
use crate::config::{BreedConfig, BreedParameters, CohortSpec, DAYS_PER_MONTH};
use crate::error::{HerdError, Result};
use crate::herd::Herd;
use crate::random::RandomStream;

/// Days into the month at which a suckling's dam is assumed to be producing.
const MID_MONTH_DAYS: f64 = 15.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitialHerdReport {
    pub created: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub dry_breeders: usize,
}

impl Herd {
    /// Create every configured cohort and link sucklings to mothers.
    ///
    /// Running short of breeding females is not an error: the leftover
    /// sucklings stay motherless and a warning is logged.
    pub fn initialise_cohorts(
        &mut self,
        breeds: &[BreedConfig],
        date: NaiveDate,
        rng: &mut RandomStream,
    ) -> Result<InitialHerdReport> {
        let mut report = InitialHerdReport::default();

        for breed in breeds {
            breed.parameters.validate()?;
            let params = Arc::new(breed.parameters.clone());
            for cohort in &breed.cohorts {
                for _ in 0..cohort.number {
                    let animal = create_individual(cohort, &params, &breed.herd_name, rng);
                    self.add_animal(animal, &breed.herd_name);
                    report.created += 1;
                }
            }
        }

        let mut herd_names: Vec<&str> = Vec::new();
        for breed in breeds {
            if !herd_names.contains(&breed.herd_name.as_str()) {
                herd_names.push(&breed.herd_name);
            }
        }
        for herd_name in herd_names {
            self.assign_mothers(herd_name, date, rng, &mut report)?;
        }

        info!(
            "Initial herd: {} animals, {} sucklings assigned, {} unassigned, {} dry breeders",
            report.created, report.assigned, report.unassigned, report.dry_breeders
        );
        Ok(report)
    }

    fn assign_mothers(
        &mut self,
        herd_name: &str,
        date: NaiveDate,
        rng: &mut RandomStream,
        report: &mut InitialHerdReport,
    ) -> Result<()> {
        // Oldest first; the sort is stable so equal ages stay in ID order.
        let mut candidates: Vec<(AnimalId, f64)> = self
            .iter()
            .filter(|animal| animal.herd_name() == herd_name && is_initial_breeder(animal))
            .map(|animal| (animal.id(), animal.age()))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        let females: Vec<AnimalId> = candidates.into_iter().map(|(id, _)| id).collect();

        // Youngest first; ties stay in ID order.
        let mut sucklings: Vec<(AnimalId, f64)> = self
            .iter()
            .filter(|animal| animal.herd_name() == herd_name && !animal.is_weaned() && animal.mother().is_none())
            .map(|animal| (animal.id(), animal.age()))
            .collect();
        sucklings.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut available = females.clone();
        // Female nursing the current litter, the litter's age and how many more it takes.
        let mut current: Option<(AnimalId, f64, usize)> = None;
        let mut with_sucklings = BTreeSet::new();

        for (index, &(suckling, suckling_age)) in sucklings.iter().enumerate() {
            if let Some((female, litter_age, remaining)) = current.as_mut() {
                if *remaining > 0 && *litter_age == suckling_age {
                    self.link_suckling(*female, suckling)?;
                    *remaining -= 1;
                    report.assigned += 1;
                    continue;
                }
            }

            let position = available.iter().position(|id| {
                self.get(*id)
                    .is_some_and(|animal| old_enough_to_have_borne(&animal, suckling_age))
            });
            let Some(position) = position else {
                let left = sucklings.len() - index;
                warn!(
                    "Insufficient breeding females to assign {} sucklings aged {} months or more in herd [{}]; they will remain unassigned until weaned",
                    left, suckling_age, herd_name
                );
                report.unassigned += left;
                break;
            };
            let female = available.remove(position);
            let litter = self
                .get(female)
                .map_or(1, |animal| animal.number_of_offspring_this_pregnancy(rng));
            self.link_suckling(female, suckling)?;
            self.prepare_mother(female, suckling_age, date)?;
            with_sucklings.insert(female);
            current = Some((female, suckling_age, litter.saturating_sub(1)));
            report.assigned += 1;
        }

        for female in females {
            if with_sucklings.contains(&female) {
                continue;
            }
            let Some(animal) = self.get_mut(female) else {
                continue;
            };
            if animal.is_pregnant() || animal.is_lactating() {
                continue;
            }
            backdate_dry_breeder(animal, date)?;
            report.dry_breeders += 1;
        }
        Ok(())
    }

    fn link_suckling(&mut self, female: AnimalId, suckling: AnimalId) -> Result<()> {
        let calf = self.get_mut(suckling).ok_or(HerdError::AnimalNotFound(suckling))?;
        calf.mother = Some(female);
        let newborn = calf.age() <= 0.0;

        let mother = self.get_mut(female).ok_or(HerdError::AnimalNotFound(female))?;
        let id = mother.id();
        let state = mother.female_mut().ok_or(HerdError::WrongSex {
            id,
            expected: Sex::Female,
        })?;
        state.add_suckling(suckling);
        state.number_of_offspring += 1;
        if newborn {
            state.offspring_born_this_step += 1;
        }
        Ok(())
    }

    /// Start lactation and back-date the birth of a newly assigned mother.
    fn prepare_mother(&mut self, female: AnimalId, suckling_age: f64, date: NaiveDate) -> Result<()> {
        let mother = self.get_mut(female).ok_or(HerdError::AnimalNotFound(female))?;
        let production = mother.milk_production_at(suckling_age * DAYS_PER_MONTH + MID_MONTH_DAYS);
        mother.set_milk_production(production, production * DAYS_PER_MONTH)?;

        let interval = mother.inter_parturition_interval_at(mother.weight());
        let birth_age = (mother.age() - suckling_age).max(0.0);
        let gestation = mother.params().gestation_length;
        if let Some(state) = mother.female_mut() {
            state.inter_parturition_interval = Some(interval);
            state.age_at_last_birth = Some(birth_age);
            state.age_at_last_conception = Some((birth_age - gestation).max(0.0));
            state.date_of_last_birth = back_date(date, suckling_age * DAYS_PER_MONTH);
            state.date_of_last_conception = back_date(date, (suckling_age + gestation) * DAYS_PER_MONTH);
            state.number_of_births += 1;
            state.number_of_conceptions += 1;
        }
        Ok(())
    }
}

fn create_individual(
    cohort: &CohortSpec,
    params: &Arc<BreedParameters>,
    herd_name: &str,
    rng: &mut RandomStream,
) -> Animal {
    let weight = cohort_weight(cohort.weight, cohort.weight_sd, rng);
    let mut animal = Animal::new(cohort.sex, Arc::clone(params), herd_name, cohort.age_months, weight);
    animal.set_weaned(!cohort.suckling);
    if cohort.sterilised {
        animal.sterilise(cohort.sex == Sex::Male);
    }
    if cohort.sire {
        if let Some(male) = animal.male_mut() {
            male.breeding_sire = true;
        }
    }
    animal.attributes = cohort.attributes.clone();
    animal.tags = cohort.tags.iter().cloned().collect();
    animal.sale_flag = HerdChangeReason::InitialHerd;
    animal
}

/// Normal draw around the cohort mean. Negative draws fall back to the mean.
fn cohort_weight(mean: f64, sd: f64, rng: &mut RandomStream) -> f64 {
    if sd <= 0.0 {
        return mean;
    }
    let weight = rng.normal(mean, sd);
    if weight < 0.0 {
        warn!("Negative initial weight drawn for mean {} and sd {}; using the mean", mean, sd);
        return mean;
    }
    weight
}

/// Old enough to have conceived at the minimum mating age and then carried and
/// nursed a suckling of `suckling_age` months.
fn old_enough_to_have_borne(animal: &Animal, suckling_age: f64) -> bool {
    let params = animal.params();
    animal.age() >= params.minimum_age_first_mating + params.gestation_length + suckling_age
}

fn is_initial_breeder(animal: &Animal) -> bool {
    animal.sex() == Sex::Female
        && animal.is_breeding_eligible()
        && animal.is_within_mating_age()
        && !animal.is_pregnant()
}

/// Mark an unassigned breeder as dry and give her a last birth consistent with
/// the number of birth intervals that fit since her first possible calving.
fn backdate_dry_breeder(animal: &mut Animal, date: NaiveDate) -> Result<()> {
    let params = animal.params();
    let gestation = params.gestation_length;
    let first_birth_days = (params.minimum_age_first_mating + gestation) * DAYS_PER_MONTH;
    let smallest_weight = animal.normalised_weight_at(params.minimum_age_first_mating);
    let minimum_interval = animal.inter_parturition_interval_at(smallest_weight);
    let interval = animal.inter_parturition_interval_at(animal.weight());
    let age_days = animal.age_in_days();

    let id = animal.id();
    let state = animal.female_mut().ok_or(HerdError::WrongSex {
        id,
        expected: Sex::Female,
    })?;
    state.dry_breeder = true;
    state.inter_parturition_interval = Some(interval);

    if age_days > first_birth_days {
        let births = (((age_days - first_birth_days) / ((interval + minimum_interval) / 2.0)).round() - 1.0).max(0.0);
        let last_birth_days = (first_birth_days + interval * births).min(age_days);
        let last_birth_age = last_birth_days / DAYS_PER_MONTH;
        state.age_at_last_birth = Some(last_birth_age);
        state.age_at_last_conception = Some((last_birth_age - gestation).max(0.0));
        state.date_of_last_birth = back_date(date, age_days - last_birth_days);
        state.date_of_last_conception = back_date(date, age_days - last_birth_days + gestation * DAYS_PER_MONTH);
    }
    Ok(())
}

fn back_date(date: NaiveDate, days: f64) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(days.max(0.0).round() as u64))
}
