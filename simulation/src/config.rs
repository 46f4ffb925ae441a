//! Breed parameters and initial herd configuration.
//!
//! Loaded before the run starts. Everything here is validated up front so the
//! engine never has to guess at a missing value.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::components::{Attribute, Sex};
use crate::error::{HerdError, Result};

/// Days in an average month, used wherever months are converted to days.
pub const DAYS_PER_MONTH: f64 = 30.4;

/// Per-breed constants shared read-only by every individual of the breed.
///
/// Ages and gestation are in months; intervals named `*_days` are in days.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedParameters {
    pub breed: String,

    // Size
    pub srw_female: f64,
    pub srw_male_multiplier: f64,
    pub srw_castrate_multiplier: f64,
    /// Birth weight as a proportion of female SRW, indexed by litter size - 1.
    pub birth_scalar: Vec<f64>,
    /// Probability of twins, triplets, ... in order.
    pub multiple_birth_rate: Vec<f64>,
    pub base_animal_equivalent: f64,

    // Growth curve
    pub age_growth_rate_coefficient: f64,
    pub srw_growth_scalar: f64,

    // Breeding
    pub gestation_length: f64,
    pub minimum_age_first_mating: f64,
    pub minimum_size_first_mating: f64,
    pub male_minimum_age_first_mating: f64,
    pub male_minimum_size_first_mating: f64,
    pub maximum_age_mating: f64,
    pub minimum_days_birth_to_conception: f64,
    pub proportion_offspring_male: f64,
    pub prenatal_mortality: f64,
    /// Zero means wean at gestation length.
    pub natural_weaning_age: f64,
    pub inter_parturition_interval_intercept: f64,
    pub inter_parturition_interval_coefficient: f64,

    // Lactation
    pub milking_days: f64,
    pub milk_peak_yield: f64,
    pub milk_offset_day: f64,
    pub milk_peak_day: f64,
    pub milk_curve_suckling: f64,
    pub milk_curve_non_suckling: f64,

    // Mortality and condition
    /// Annual base mortality probability.
    pub mortality_base: f64,
    pub rel_bc_to_score_rate: f64,
    /// Minimum, score at relative condition 1, maximum.
    pub bc_score_range: [f64; 3],
}

impl Default for BreedParameters {
    fn default() -> Self {
        Self {
            breed: "Bos indicus".to_string(),
            srw_female: 450.0,
            srw_male_multiplier: 1.4,
            srw_castrate_multiplier: 1.2,
            birth_scalar: vec![0.07, 0.055],
            multiple_birth_rate: Vec::new(),
            base_animal_equivalent: 450.0,
            age_growth_rate_coefficient: 0.0125,
            srw_growth_scalar: 0.32,
            gestation_length: 9.0,
            minimum_age_first_mating: 24.0,
            minimum_size_first_mating: 0.6,
            male_minimum_age_first_mating: 24.0,
            male_minimum_size_first_mating: 0.6,
            maximum_age_mating: 120.0,
            minimum_days_birth_to_conception: 61.0,
            proportion_offspring_male: 0.5,
            prenatal_mortality: 0.079,
            natural_weaning_age: 6.0,
            inter_parturition_interval_intercept: 10.847,
            inter_parturition_interval_coefficient: -0.7994,
            milking_days: 300.0,
            milk_peak_yield: 8.0,
            milk_offset_day: 4.0,
            milk_peak_day: 45.0,
            milk_curve_suckling: 0.6,
            milk_curve_non_suckling: 0.11,
            mortality_base: 0.03,
            rel_bc_to_score_rate: 0.15,
            bc_score_range: [0.0, 3.0, 5.0],
        }
    }
}

impl BreedParameters {
    /// Weaning age in months, falling back to gestation length when unset.
    pub fn weaning_age(&self) -> f64 {
        if self.natural_weaning_age <= 0.0 {
            self.gestation_length
        } else {
            self.natural_weaning_age
        }
    }

    pub fn gestation_length_days(&self) -> f64 {
        self.gestation_length * DAYS_PER_MONTH
    }

    /// Largest litter the multiple-birth distribution can produce.
    pub fn maximum_litter_size(&self) -> usize {
        self.multiple_birth_rate.len() + 1
    }

    /// Birth weight proportion of SRW for a litter of `litter_size`.
    pub fn birth_scalar_for(&self, litter_size: usize) -> f64 {
        let index = litter_size.saturating_sub(1).min(self.birth_scalar.len().saturating_sub(1));
        self.birth_scalar.get(index).copied().unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(HerdError::Configuration(format!("[{}] {}", self.breed, msg)));

        if self.srw_female <= 0.0 {
            return fail("srw_female must be greater than zero".into());
        }
        if self.srw_male_multiplier <= 0.0 || self.srw_castrate_multiplier <= 0.0 {
            return fail("SRW multipliers must be greater than zero".into());
        }
        if self.base_animal_equivalent <= 0.0 {
            return fail("base_animal_equivalent must be greater than zero".into());
        }
        if self.birth_scalar.is_empty() {
            return fail("birth_scalar requires at least a value for single births".into());
        }
        if self.birth_scalar.iter().any(|s| !(0.0..=1.0).contains(s)) {
            return fail("birth_scalar values must be within 0-1".into());
        }
        if self.multiple_birth_rate.iter().any(|r| !(0.0..=1.0).contains(r)) {
            return fail("multiple_birth_rate values must be within 0-1".into());
        }
        for (name, value) in [
            ("minimum_size_first_mating", self.minimum_size_first_mating),
            ("male_minimum_size_first_mating", self.male_minimum_size_first_mating),
            ("proportion_offspring_male", self.proportion_offspring_male),
            ("prenatal_mortality", self.prenatal_mortality),
            ("mortality_base", self.mortality_base),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{} must be within 0-1, got {}", name, value));
            }
        }
        if self.gestation_length <= 0.0 {
            return fail("gestation_length must be greater than zero".into());
        }
        if self.minimum_age_first_mating == 0.0 && self.minimum_size_first_mating == 0.0 {
            return fail("minimum age and size of first mating cannot both be zero".into());
        }
        if self.male_minimum_age_first_mating == 0.0 && self.male_minimum_size_first_mating == 0.0 {
            return fail("male minimum age and size of first mating cannot both be zero".into());
        }
        if self.milk_peak_day <= 0.0 {
            return fail("milk_peak_day must be greater than zero".into());
        }
        Ok(())
    }
}

/// A group of identical individuals present at the start of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSpec {
    pub sex: Sex,
    pub age_months: f64,
    #[serde(default = "one")]
    pub number: u32,
    /// Mean live weight; zero uses normalised weight for age.
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub weight_sd: f64,
    #[serde(default)]
    pub suckling: bool,
    #[serde(default)]
    pub sire: bool,
    #[serde(default)]
    pub sterilised: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn one() -> u32 {
    1
}

impl CohortSpec {
    pub fn new(sex: Sex, age_months: f64, number: u32) -> Self {
        Self {
            sex,
            age_months,
            number,
            weight: 0.0,
            weight_sd: 0.0,
            suckling: false,
            sire: false,
            sterilised: false,
            attributes: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64, sd: f64) -> Self {
        self.weight = weight;
        self.weight_sd = sd;
        self
    }

    pub fn suckling(mut self) -> Self {
        self.suckling = true;
        self
    }

    pub fn sire(mut self) -> Self {
        self.sire = true;
        self
    }
}

/// One herd of a single breed and its starting cohorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedConfig {
    pub herd_name: String,
    #[serde(default)]
    pub parameters: BreedParameters,
    #[serde(default)]
    pub cohorts: Vec<CohortSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HerdConfig {
    pub seed: u64,
    pub start_date: NaiveDate,
    pub step_months: u32,
    /// Probability of conception used by the fixed conception model.
    pub conception_rate: f64,
    pub breeds: Vec<BreedConfig>,
}

impl Default for HerdConfig {
    fn default() -> Self {
        let parameters = BreedParameters::default();
        Self {
            seed: 1,
            start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            step_months: 1,
            conception_rate: 0.08,
            breeds: vec![BreedConfig {
                herd_name: "Breeders".to_string(),
                parameters,
                cohorts: vec![
                    CohortSpec::new(Sex::Female, 36.0, 40).with_weight(300.0, 20.0),
                    CohortSpec::new(Sex::Female, 60.0, 40).with_weight(340.0, 20.0),
                    CohortSpec::new(Sex::Female, 18.0, 20),
                    CohortSpec::new(Sex::Male, 48.0, 3).with_weight(550.0, 25.0).sire(),
                    CohortSpec::new(Sex::Female, 3.0, 15).suckling(),
                    CohortSpec::new(Sex::Male, 3.0, 15).suckling(),
                ],
            }],
        }
    }
}

impl HerdConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: HerdConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.conception_rate) {
            return Err(HerdError::Configuration(format!(
                "conception_rate must be within 0-1, got {}",
                self.conception_rate
            )));
        }
        for breed in &self.breeds {
            breed.parameters.validate()?;
            for cohort in &breed.cohorts {
                if cohort.age_months < 0.0 || cohort.weight < 0.0 || cohort.weight_sd < 0.0 {
                    return Err(HerdError::Configuration(format!(
                        "cohort in herd [{}] has a negative age, weight or weight sd",
                        breed.herd_name
                    )));
                }
                if cohort.sire && cohort.sex == Sex::Female {
                    return Err(HerdError::Configuration(format!(
                        "cohort in herd [{}] marks females as breeding sires",
                        breed.herd_name
                    )));
                }
            }
        }
        Ok(())
    }
}
