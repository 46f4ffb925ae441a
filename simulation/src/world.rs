//! Herd simulation - main orchestrator

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::cohorts::InitialHerdReport;
use crate::components::Calendar;
use crate::config::HerdConfig;
use crate::error::Result;
use crate::events::HerdEvent;
use crate::herd::Herd;
use crate::random::RandomStream;
use crate::systems::{self, ConceptionModel, FixedConceptionRate};

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    pub tick: u64,
    pub date: NaiveDate,
    pub fetal_losses: u32,
    pub births: u32,
    pub conceptions: u32,
    pub weaned: u32,
    pub deaths: u32,
    pub population: usize,
}

pub struct HerdSimulation {
    pub herd: Herd,
    pub calendar: Calendar,
    rng: RandomStream,
    conception_model: Box<dyn ConceptionModel + Send>,
    initial_report: InitialHerdReport,
}

impl HerdSimulation {
    /// Validate the configuration and build the initial herd.
    pub fn new(config: &HerdConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = RandomStream::new(config.seed);
        let calendar = Calendar::new(config.start_date, config.step_months);
        let mut herd = Herd::new();
        let initial_report = herd.initialise_cohorts(&config.breeds, calendar.date, &mut rng)?;

        Ok(Self {
            herd,
            calendar,
            rng,
            conception_model: Box::new(FixedConceptionRate::new(config.conception_rate)),
            initial_report,
        })
    }

    pub fn with_conception_model(mut self, model: impl ConceptionModel + Send + 'static) -> Self {
        self.conception_model = Box::new(model);
        self
    }

    pub fn initial_report(&self) -> &InitialHerdReport {
        &self.initial_report
    }

    /// Run one step: age, lose fetuses, deliver, mate, wean, then base mortality.
    pub fn tick(&mut self) -> Result<TickResult> {
        self.calendar.advance();
        let step = self.calendar.step_length();

        systems::aging_system(&mut self.herd, step);
        let fetal_losses = systems::fetal_mortality_system(&mut self.herd, &self.calendar, &mut self.rng)?;
        let births = systems::birth_system(&mut self.herd, &self.calendar)?;
        let conceptions = systems::breeding_system(
            &mut self.herd,
            &self.calendar,
            self.conception_model.as_ref(),
            &mut self.rng,
        )?;
        let weaned = systems::weaning_system(&mut self.herd, &self.calendar)?;
        let deaths = systems::death_system(&mut self.herd, &self.calendar, &mut self.rng)?;

        Ok(TickResult {
            tick: self.calendar.tick,
            date: self.calendar.date,
            fetal_losses,
            births,
            conceptions,
            weaned,
            deaths,
            population: self.herd.len(),
        })
    }

    /// Run `ticks` steps, logging a summary at the end of each year.
    pub fn run(&mut self, ticks: u64) -> Result<Vec<TickResult>> {
        let mut results = Vec::with_capacity(ticks as usize);
        for _ in 0..ticks {
            let result = self.tick()?;
            if self.calendar.month() == 12 {
                info!(
                    "Year {}: population {}, {} births, {} deaths this step",
                    self.calendar.year(),
                    result.population,
                    result.births,
                    result.deaths
                );
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Report final breeding statistics, empty the herd and return every
    /// event not yet taken.
    pub fn finish(&mut self) -> Vec<HerdEvent> {
        self.herd.end_of_simulation();
        self.herd.take_events()
    }

    pub fn population(&self) -> usize {
        self.herd.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_runs() {
        let mut sim = HerdSimulation::new(&HerdConfig::default()).unwrap();
        let start = sim.population();
        assert_eq!(start, 133);
        assert_eq!(sim.initial_report().assigned, 30);

        let results = sim.run(24).unwrap();
        assert_eq!(results.len(), 24);
        assert_eq!(results[23].tick, 24);
        assert_eq!(sim.calendar.date, NaiveDate::from_ymd_opt(2002, 1, 1).unwrap());
        assert!(results.iter().map(|r| r.births).sum::<u32>() > 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sim = HerdSimulation::new(&HerdConfig::default()).unwrap();
            sim.run(36).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_finish_empties_herd() {
        let mut sim = HerdSimulation::new(&HerdConfig::default()).unwrap();
        sim.run(3).unwrap();
        let events = sim.finish();
        assert_eq!(sim.population(), 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, HerdEvent::FinalFemaleBreedingStats(_))));
    }

    struct NeverConceive;

    impl ConceptionModel for NeverConceive {
        fn conception_rate(&self, _female: &crate::animal::Animal) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_custom_conception_model() {
        let mut sim = HerdSimulation::new(&HerdConfig::default())
            .unwrap()
            .with_conception_model(NeverConceive);
        let results = sim.run(12).unwrap();
        assert_eq!(results.iter().map(|r| r.conceptions).sum::<u32>(), 0);
    }
}
