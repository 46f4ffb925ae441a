//! Animal entity: one individual's biology.
//!
//! An `Animal` is a common core (age, weight, intake, flags) plus a sex-specific
//! payload in [`AnimalKind`]. Growth and feeding models outside this crate push
//! weights and intake in through the mutators here; everything else is derived.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::components::{AnimalClass, AnimalId, Attribute, HerdChangeReason, Inheritance, Sex};
use crate::config::{BreedParameters, DAYS_PER_MONTH};
use crate::female::FemaleState;

/// Age used in place of zero wherever age is a divisor.
pub const CORRECTED_NEWBORN_AGE: f64 = 0.1;

/// Running intake totals for the current step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    pub amount: f64,
    pub potential: f64,
    /// Diet dry matter digestibility (%).
    pub dmd: f64,
    /// Diet nitrogen (%).
    pub n_percent: f64,
}

/// Energy terms supplied by the growth model each step (MJ).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    pub intake: f64,
    pub maintenance: f64,
    pub growth: f64,
    pub pregnancy: f64,
    pub lactation: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaleState {
    pub breeding_sire: bool,
    pub castrated: bool,
}

#[derive(Debug, Clone)]
pub enum AnimalKind {
    Male(MaleState),
    Female(FemaleState),
}

#[derive(Debug, Clone)]
pub struct Animal {
    pub(crate) id: AnimalId,
    params: Arc<BreedParameters>,
    herd_name: String,
    age: f64,
    weight: f64,
    previous_weight: f64,
    highest_weight: f64,
    birth_weight: f64,
    standard_reference_weight: f64,
    normalised_weight: f64,
    adult_equivalent: f64,
    intake: Intake,
    pub energy: EnergyBalance,
    wool: f64,
    cashmere: f64,
    weaned: bool,
    sterilised: bool,
    pub(crate) mother: Option<AnimalId>,
    pub sale_flag: HerdChangeReason,
    pub tags: BTreeSet<String>,
    pub attributes: BTreeMap<String, Attribute>,
    pub(crate) kind: AnimalKind,
}

impl Animal {
    /// Create an individual of `age_months`. A non-positive `weight` falls back to
    /// the normalised weight for that age.
    pub fn new(
        sex: Sex,
        params: Arc<BreedParameters>,
        herd_name: impl Into<String>,
        age_months: f64,
        weight: f64,
    ) -> Self {
        let standard_reference_weight = match sex {
            Sex::Female => params.srw_female,
            Sex::Male => params.srw_female * params.srw_male_multiplier,
        };
        let birth_weight = params.birth_scalar_for(1) * params.srw_female;
        let kind = match sex {
            Sex::Male => AnimalKind::Male(MaleState::default()),
            Sex::Female => AnimalKind::Female(FemaleState::default()),
        };
        let age = age_months.max(0.0);
        let weaned = age >= params.weaning_age();

        let mut animal = Self {
            id: AnimalId::UNASSIGNED,
            params,
            herd_name: herd_name.into(),
            age,
            weight: 0.0,
            previous_weight: 0.0,
            highest_weight: 0.0,
            birth_weight,
            standard_reference_weight,
            normalised_weight: 0.0,
            adult_equivalent: 0.0,
            intake: Intake::default(),
            energy: EnergyBalance::default(),
            wool: 0.0,
            cashmere: 0.0,
            weaned,
            sterilised: false,
            mother: None,
            sale_flag: HerdChangeReason::None,
            tags: BTreeSet::new(),
            attributes: BTreeMap::new(),
            kind,
        };
        animal.set_age(age);

        let start_weight = if weight > 0.0 {
            weight
        } else if age == 0.0 {
            birth_weight
        } else {
            animal.normalised_weight
        };
        animal.set_weight(start_weight);
        animal.previous_weight = start_weight;
        animal
    }

    /// An unweaned age-zero individual of the given birth weight.
    pub fn newborn(sex: Sex, params: Arc<BreedParameters>, herd_name: impl Into<String>, weight: f64) -> Self {
        let mut animal = Self::new(sex, params, herd_name, 0.0, weight);
        animal.birth_weight = animal.weight;
        animal.weaned = false;
        animal
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn id(&self) -> AnimalId {
        self.id
    }

    pub fn sex(&self) -> Sex {
        match self.kind {
            AnimalKind::Male(_) => Sex::Male,
            AnimalKind::Female(_) => Sex::Female,
        }
    }

    pub fn kind(&self) -> &AnimalKind {
        &self.kind
    }

    pub fn breed(&self) -> &str {
        &self.params.breed
    }

    pub fn herd_name(&self) -> &str {
        &self.herd_name
    }

    pub fn params(&self) -> &BreedParameters {
        &self.params
    }

    pub fn shared_params(&self) -> Arc<BreedParameters> {
        Arc::clone(&self.params)
    }

    /// The dam this individual is linked to. The dam may have left the herd if
    /// this individual was already weaned.
    pub fn mother(&self) -> Option<AnimalId> {
        self.mother
    }

    pub fn male(&self) -> Option<&MaleState> {
        match &self.kind {
            AnimalKind::Male(male) => Some(male),
            AnimalKind::Female(_) => None,
        }
    }

    pub fn male_mut(&mut self) -> Option<&mut MaleState> {
        match &mut self.kind {
            AnimalKind::Male(male) => Some(male),
            AnimalKind::Female(_) => None,
        }
    }

    pub fn female(&self) -> Option<&FemaleState> {
        match &self.kind {
            AnimalKind::Female(female) => Some(female),
            AnimalKind::Male(_) => None,
        }
    }

    pub fn female_mut(&mut self) -> Option<&mut FemaleState> {
        match &mut self.kind {
            AnimalKind::Female(female) => Some(female),
            AnimalKind::Male(_) => None,
        }
    }

    // ------------------------------------------------------------------
    // Age
    // ------------------------------------------------------------------

    /// Age in months.
    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn age_in_days(&self) -> f64 {
        self.age * DAYS_PER_MONTH
    }

    /// Age with newborns lifted to [`CORRECTED_NEWBORN_AGE`].
    pub fn corrected_age(&self) -> f64 {
        if self.age <= 0.0 {
            CORRECTED_NEWBORN_AGE
        } else {
            self.age
        }
    }

    /// Set age in months and recompute the normalised weight for it.
    pub fn set_age(&mut self, months: f64) {
        self.age = months.max(0.0);
        self.normalised_weight = self.normalised_weight_at(self.age);
    }

    pub fn increment_age(&mut self) {
        self.advance_age(1.0);
    }

    pub fn advance_age(&mut self, months: f64) {
        self.set_age(self.age + months.max(0.0));
    }

    // ------------------------------------------------------------------
    // Weight
    // ------------------------------------------------------------------

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn previous_weight(&self) -> f64 {
        self.previous_weight
    }

    pub fn highest_weight(&self) -> f64 {
        self.highest_weight
    }

    pub fn birth_weight(&self) -> f64 {
        self.birth_weight
    }

    pub fn weight_gain(&self) -> f64 {
        self.weight - self.previous_weight
    }

    pub fn set_weight(&mut self, kg: f64) {
        self.previous_weight = self.weight;
        self.weight = kg;
        self.highest_weight = self.highest_weight.max(kg);
        self.adult_equivalent = (kg / self.params.base_animal_equivalent).powf(0.75);
    }

    pub fn standard_reference_weight(&self) -> f64 {
        self.standard_reference_weight
    }

    /// Expected weight for the current age on the breed growth curve.
    pub fn normalised_weight(&self) -> f64 {
        self.normalised_weight
    }

    /// Growth curve `SRW - (1 - birth proportion) * SRW * exp(-k * days / SRW^scalar)`.
    pub fn normalised_weight_at(&self, age_months: f64) -> f64 {
        let srw = self.standard_reference_weight;
        let birth_proportion = self.params.birth_scalar_for(1);
        let age_days = age_months * DAYS_PER_MONTH;
        let exponent = -(self.params.age_growth_rate_coefficient * age_days)
            / srw.powf(self.params.srw_growth_scalar);
        srw - (1.0 - birth_proportion) * srw * exponent.exp()
    }

    pub fn relative_size(&self) -> f64 {
        self.normalised_weight / self.standard_reference_weight
    }

    pub fn relative_condition(&self) -> f64 {
        if self.normalised_weight <= 0.0 {
            return 1.0;
        }
        self.weight / self.normalised_weight
    }

    pub fn adult_equivalent(&self) -> f64 {
        self.adult_equivalent
    }

    pub fn body_condition_score(&self) -> f64 {
        let [low, mid, high] = self.params.bc_score_range;
        let score = mid + (self.relative_condition() - 1.0) / self.params.rel_bc_to_score_rate;
        score.clamp(low, high)
    }

    /// Mean daily gain since birth (kg/day).
    pub fn average_daily_gain(&self) -> f64 {
        (self.weight - self.birth_weight) / (self.corrected_age() * DAYS_PER_MONTH)
    }

    // ------------------------------------------------------------------
    // Intake and energy
    // ------------------------------------------------------------------

    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    /// Add feed eaten this step, keeping DMD and %N as intake-weighted means.
    pub fn add_intake(&mut self, amount: f64, dmd: f64, n_percent: f64) {
        if amount <= 0.0 {
            return;
        }
        let total = self.intake.amount + amount;
        self.intake.dmd = (self.intake.dmd * self.intake.amount + dmd * amount) / total;
        self.intake.n_percent = (self.intake.n_percent * self.intake.amount + n_percent * amount) / total;
        self.intake.amount = total;
    }

    pub fn set_potential_intake(&mut self, potential: f64) {
        self.intake.potential = potential.max(0.0);
    }

    pub fn reset_intake(&mut self) {
        self.intake = Intake::default();
    }

    // ------------------------------------------------------------------
    // Fleece
    // ------------------------------------------------------------------

    pub fn wool(&self) -> f64 {
        self.wool
    }

    pub fn cashmere(&self) -> f64 {
        self.cashmere
    }

    pub fn add_fleece(&mut self, wool: f64, cashmere: f64) {
        self.wool += wool.max(0.0);
        self.cashmere += cashmere.max(0.0);
    }

    /// Remove and return the accumulated (wool, cashmere).
    pub fn shear(&mut self) -> (f64, f64) {
        let clip = (self.wool, self.cashmere);
        self.wool = 0.0;
        self.cashmere = 0.0;
        clip
    }

    // ------------------------------------------------------------------
    // Lifecycle and breeding status
    // ------------------------------------------------------------------

    pub fn is_weaned(&self) -> bool {
        self.weaned
    }

    pub(crate) fn set_weaned(&mut self, weaned: bool) {
        self.weaned = weaned;
    }

    pub fn is_sterilised(&self) -> bool {
        self.sterilised
    }

    /// Sterilise the individual. Castrated males take the castrate SRW.
    pub fn sterilise(&mut self, castrate: bool) {
        self.sterilised = true;
        if let AnimalKind::Male(male) = &mut self.kind {
            if castrate {
                male.castrated = true;
                male.breeding_sire = false;
                self.standard_reference_weight = self.params.srw_female * self.params.srw_castrate_multiplier;
                self.normalised_weight = self.normalised_weight_at(self.age);
            }
        }
    }

    /// Not yet at both the minimum mating age and the minimum mating size.
    /// Size uses the highest weight attained so short-term losses do not
    /// push an animal back below the threshold.
    pub fn is_pre_breeder(&self) -> bool {
        let (min_age, min_size) = match self.kind {
            AnimalKind::Female(_) => (self.params.minimum_age_first_mating, self.params.minimum_size_first_mating),
            AnimalKind::Male(_) => (
                self.params.male_minimum_age_first_mating,
                self.params.male_minimum_size_first_mating,
            ),
        };
        self.age < min_age || self.highest_weight < min_size * self.standard_reference_weight
    }

    pub fn is_breeding_eligible(&self) -> bool {
        self.weaned && !self.sterilised && !self.is_pre_breeder()
    }

    pub fn is_breeding_sire(&self) -> bool {
        matches!(&self.kind, AnimalKind::Male(male) if male.breeding_sire)
    }

    pub fn class(&self) -> AnimalClass {
        if !self.weaned {
            return AnimalClass::Suckling;
        }
        if self.age < 12.0 {
            return AnimalClass::Weaner;
        }
        match &self.kind {
            AnimalKind::Female(female) => {
                if self.is_pre_breeder() {
                    AnimalClass::PreBreeder
                } else if female.number_of_births == 0 {
                    AnimalClass::Heifer
                } else {
                    AnimalClass::Breeder
                }
            }
            AnimalKind::Male(male) => {
                if male.castrated {
                    AnimalClass::Castrate
                } else if male.breeding_sire {
                    AnimalClass::Sire
                } else if self.is_pre_breeder() {
                    AnimalClass::PreBreeder
                } else {
                    AnimalClass::Bull
                }
            }
        }
    }

    /// Attributes passed on to offspring at birth.
    pub fn inheritable_attributes(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.inheritance == Inheritance::Maternal)
    }
}
