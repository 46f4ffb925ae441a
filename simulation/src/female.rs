//! Female reproductive state machine.
//!
//! Conception fills the fetus list, per-step mortality may empty it, and birth
//! clears it and opens lactation. A female can be pregnant while still nursing.
//! Newborn creation itself lives on [`crate::herd::Herd::give_birth`] because it
//! touches the herd arena.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::animal::{Animal, AnimalKind};
use crate::components::{AnimalId, HerdChangeReason, MilkUse, Sex};
use crate::config::{BreedParameters, DAYS_PER_MONTH};
use crate::error::{HerdError, Result};
use crate::events::ConceptionStatus;
use crate::random::RandomStream;

/// Slack when comparing fractional month ages.
const AGE_TOLERANCE: f64 = 1e-6;

/// Lactation bookkeeping for the current step and the lactation so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milk {
    /// Milk left to draw this step (L).
    pub available: f64,
    /// Daily production (L/day).
    pub production_rate: f64,
    pub suckled_this_step: f64,
    pub milked_this_step: f64,
    pub suckled_total: f64,
    pub milked_total: f64,
    pub proportion_production_achieved: f64,
    pub lag: f64,
    pub manually_milked: bool,
}

impl Default for Milk {
    fn default() -> Self {
        Self {
            available: 0.0,
            production_rate: 0.0,
            suckled_this_step: 0.0,
            milked_this_step: 0.0,
            suckled_total: 0.0,
            milked_total: 0.0,
            proportion_production_achieved: 1.0,
            lag: 1.0,
            manually_milked: false,
        }
    }
}

impl Milk {
    pub fn reset_step(&mut self) {
        self.suckled_this_step = 0.0;
        self.milked_this_step = 0.0;
    }

    /// Draw up to `amount` from what is available; returns what was taken.
    pub fn take(&mut self, amount: f64, reason: MilkUse) -> f64 {
        let taken = amount.min(self.available).max(0.0);
        self.available -= taken;
        match reason {
            MilkUse::Suckling => {
                self.suckled_this_step += taken;
                self.suckled_total += taken;
            }
            MilkUse::Milked => {
                self.milked_this_step += taken;
                self.milked_total += taken;
            }
        }
        taken
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FemaleState {
    fetuses: Vec<Sex>,
    /// Ages in months at the last conception and birth.
    pub age_at_last_conception: Option<f64>,
    pub age_at_last_birth: Option<f64>,
    pub date_of_last_conception: Option<NaiveDate>,
    pub date_of_last_birth: Option<NaiveDate>,
    pub number_of_births: u32,
    pub number_of_offspring: u32,
    pub number_of_weaned: u32,
    pub number_of_conceptions: u32,
    pub offspring_born_this_step: u32,
    pub previous_conception_rate: f64,
    pub weight_at_conception: f64,
    pub relative_condition_at_conception: f64,
    pub weight_at_parturition: f64,
    pub relative_condition_at_parturition: f64,
    /// Conceptus mass accumulated by the growth model (kg).
    pub conceptus_weight: f64,
    /// Expected days between births.
    pub inter_parturition_interval: Option<f64>,
    pub dry_breeder: bool,
    pub(crate) suckling_offspring: Vec<AnimalId>,
    pub milk: Milk,
}

impl FemaleState {
    pub fn fetuses(&self) -> &[Sex] {
        &self.fetuses
    }

    pub fn carrying_count(&self) -> usize {
        self.fetuses.len()
    }

    pub fn is_pregnant(&self) -> bool {
        !self.fetuses.is_empty()
    }

    pub fn suckling_offspring(&self) -> &[AnimalId] {
        &self.suckling_offspring
    }

    pub(crate) fn add_suckling(&mut self, id: AnimalId) {
        if !self.suckling_offspring.contains(&id) {
            self.suckling_offspring.push(id);
        }
    }

    /// Drop `id` from the nursing list. Returns false if it was not there.
    pub(crate) fn remove_suckling(&mut self, id: AnimalId) -> bool {
        let before = self.suckling_offspring.len();
        self.suckling_offspring.retain(|s| *s != id);
        self.suckling_offspring.len() != before
    }
}

/// Per-step probability that one carried fetus is lost.
pub fn fetal_mortality_probability(params: &BreedParameters, step_months: f64) -> f64 {
    let monthly = params.prenatal_mortality / (params.gestation_length + 1.0);
    (monthly * step_months).clamp(0.0, 1.0)
}

impl Animal {
    fn require_female(&self) -> Result<&FemaleState> {
        self.female().ok_or(HerdError::WrongSex {
            id: self.id,
            expected: Sex::Female,
        })
    }

    fn require_female_mut(&mut self) -> Result<&mut FemaleState> {
        let id = self.id;
        self.female_mut().ok_or(HerdError::WrongSex {
            id,
            expected: Sex::Female,
        })
    }

    pub fn is_pregnant(&self) -> bool {
        self.female().is_some_and(FemaleState::is_pregnant)
    }

    pub fn carrying_count(&self) -> usize {
        self.female().map_or(0, FemaleState::carrying_count)
    }

    pub fn days_pregnant(&self) -> f64 {
        match self.female() {
            Some(female) if female.is_pregnant() => female
                .age_at_last_conception
                .map_or(0.0, |conceived| ((self.age() - conceived) * DAYS_PER_MONTH).max(0.0)),
            _ => 0.0,
        }
    }

    pub fn days_since_last_birth(&self) -> Option<f64> {
        self.female()
            .and_then(|female| female.age_at_last_birth)
            .map(|born| ((self.age() - born) * DAYS_PER_MONTH).max(0.0))
    }

    /// Pregnant and carried for at least the gestation length.
    pub fn is_birth_due(&self) -> bool {
        match self.female() {
            Some(female) if female.is_pregnant() => female
                .age_at_last_conception
                .is_some_and(|conceived| self.age() - conceived + AGE_TOLERANCE >= self.params().gestation_length),
            _ => false,
        }
    }

    pub fn is_lactating(&self) -> bool {
        let Some(female) = self.female() else {
            return false;
        };
        let nursing = !female.suckling_offspring.is_empty() || female.milk.manually_milked;
        nursing
            && self
                .days_since_last_birth()
                .is_some_and(|days| days <= self.params().milking_days)
    }

    pub fn is_dry_breeder(&self) -> bool {
        self.female().is_some_and(|female| female.dry_breeder)
    }

    /// Females: eligible, not pregnant and far enough past the last birth.
    /// Males: eligible and flagged as a breeding sire.
    pub fn is_able_to_breed(&self) -> bool {
        if !self.is_breeding_eligible() {
            return false;
        }
        match self.kind() {
            AnimalKind::Male(male) => male.breeding_sire,
            AnimalKind::Female(female) => {
                !female.is_pregnant()
                    && self
                        .days_since_last_birth()
                        .map_or(true, |days| days >= self.params().minimum_days_birth_to_conception)
            }
        }
    }

    pub fn is_within_mating_age(&self) -> bool {
        self.age() <= self.params().maximum_age_mating
    }

    /// Draw a litter size from the multiple-birth distribution. The first
    /// cumulative rate at or above the draw wins; anything past the listed rates
    /// is a single birth.
    pub fn number_of_offspring_this_pregnancy(&self, rng: &mut RandomStream) -> usize {
        let rates = &self.params().multiple_birth_rate;
        if rates.is_empty() {
            return 1;
        }
        let draw = rng.next_f64();
        let mut cumulative = 0.0;
        for (index, rate) in rates.iter().enumerate() {
            cumulative += rate;
            if draw <= cumulative {
                return index + 2;
            }
        }
        1
    }

    /// Record a conception carrying `number` fetuses, each sexed independently.
    pub fn update_conception_details(
        &mut self,
        number: usize,
        rate: f64,
        age_offset: f64,
        date: NaiveDate,
        rng: &mut RandomStream,
    ) -> Result<()> {
        let id = self.id;
        let proportion_male = self.params().proportion_offspring_male;
        let number = number.min(self.params().maximum_litter_size());
        let conception_age = (self.age() + age_offset).max(0.0);
        let weight = self.weight();
        let condition = self.relative_condition();

        let female = self.require_female_mut()?;
        if female.is_pregnant() {
            return Err(HerdError::AlreadyPregnant(id));
        }
        if number == 0 {
            return Ok(());
        }

        female.fetuses = (0..number)
            .map(|_| {
                if rng.next_f64() <= proportion_male {
                    Sex::Male
                } else {
                    Sex::Female
                }
            })
            .collect();
        female.age_at_last_conception = Some(conception_age);
        female.date_of_last_conception = Some(date);
        female.weight_at_conception = weight;
        female.relative_condition_at_conception = condition;
        female.previous_conception_rate = rate;
        female.number_of_conceptions += 1;
        female.dry_breeder = false;

        if self.sale_flag == HerdChangeReason::DryBreederSale {
            self.sale_flag = HerdChangeReason::None;
        }
        Ok(())
    }

    /// Lose one fetus. Returns true when that ends the pregnancy, in which case
    /// the loss is recorded as the last birth.
    pub fn one_offspring_dies(&mut self, date: NaiveDate) -> Result<bool> {
        let age = self.age();
        let female = self.require_female_mut()?;
        if female.fetuses.pop().is_none() {
            return Ok(false);
        }
        if female.fetuses.is_empty() {
            female.date_of_last_birth = Some(date);
            female.age_at_last_birth = Some(age);
            female.conceptus_weight = 0.0;
            return Ok(true);
        }
        Ok(false)
    }

    /// One mortality draw per carried fetus. Reports `Failed` when the last is lost.
    pub fn fetus_newborn_mortality(
        &mut self,
        step_months: f64,
        date: NaiveDate,
        rng: &mut RandomStream,
    ) -> Result<Option<ConceptionStatus>> {
        let carrying = self.require_female()?.carrying_count();
        let probability = fetal_mortality_probability(self.params(), step_months);
        for _ in 0..carrying {
            if rng.chance(probability) && self.one_offspring_dies(date)? {
                return Ok(Some(ConceptionStatus::Failed));
            }
        }
        Ok(None)
    }

    /// Sex and birth weight of each fetus, scaled by the dam's condition.
    pub fn birth_weights(&self) -> Result<Vec<(Sex, f64)>> {
        let female = self.require_female()?;
        let scalar = self.params().birth_scalar_for(female.carrying_count());
        let weight = scalar * self.standard_reference_weight() * (1.0 - 0.33 * (1.0 - self.relative_condition()));
        Ok(female.fetuses.iter().map(|sex| (*sex, weight)).collect())
    }

    /// Close out a pregnancy after the newborns have been created.
    /// Returns the number of offspring born.
    pub(crate) fn complete_birth(&mut self, date: NaiveDate) -> Result<usize> {
        let age = self.age();
        let weight = self.weight();
        let condition = self.relative_condition();
        let female = self.require_female_mut()?;
        let born = female.fetuses.len();
        if born == 0 {
            return Ok(0);
        }
        female.number_of_births += 1;
        female.number_of_offspring += born as u32;
        female.offspring_born_this_step += born as u32;
        female.conceptus_weight = 0.0;
        female.milk.proportion_production_achieved = 1.0;
        female.milk.lag = 1.0;
        female.milk.production_rate = 0.0;
        female.fetuses.clear();
        female.age_at_last_birth = Some(age);
        female.date_of_last_birth = Some(date);
        female.weight_at_parturition = weight;
        female.relative_condition_at_parturition = condition;
        female.dry_breeder = false;
        Ok(born)
    }

    /// Draw milk for sucklings or milking, clamped to what is available.
    pub fn take_milk(&mut self, amount: f64, reason: MilkUse) -> Result<f64> {
        Ok(self.require_female_mut()?.milk.take(amount, reason))
    }

    /// Production supplied by the lactation model for this step.
    pub fn set_milk_production(&mut self, rate_per_day: f64, available: f64) -> Result<()> {
        let milk = &mut self.require_female_mut()?.milk;
        milk.production_rate = rate_per_day.max(0.0);
        milk.available = available.max(0.0);
        Ok(())
    }

    /// Clear per-step milk and birth tallies. Does nothing for males.
    pub fn reset_step(&mut self) {
        if let Some(female) = self.female_mut() {
            female.milk.reset_step();
            female.offspring_born_this_step = 0;
        }
    }

    pub fn set_manually_milked(&mut self, milked: bool) -> Result<()> {
        self.require_female_mut()?.milk.manually_milked = milked;
        Ok(())
    }

    /// Lactation curve yield (L/day) on day `day` of lactation.
    pub fn milk_production_at(&self, day: f64) -> f64 {
        let params = self.params();
        let curve = if self
            .female()
            .is_some_and(|female| !female.suckling_offspring.is_empty())
        {
            params.milk_curve_suckling
        } else {
            params.milk_curve_non_suckling
        };
        let scaled = (day + params.milk_offset_day) / params.milk_peak_day;
        let production = params.milk_peak_yield * self.relative_condition().min(1.0)
            * scaled.powf(curve)
            * (curve * (1.0 - scaled)).exp();
        production.max(0.0)
    }

    /// Expected days between births at `weight`, never shorter than gestation
    /// plus two months.
    pub fn inter_parturition_interval_at(&self, weight: f64) -> f64 {
        let params = self.params();
        let relative = weight / self.standard_reference_weight();
        let interval = params.inter_parturition_interval_intercept
            * relative.powf(params.inter_parturition_interval_coefficient)
            * DAYS_PER_MONTH;
        interval.max((params.gestation_length + 2.0) * DAYS_PER_MONTH)
    }
}
