//! Whole-herd scenarios through the public API.

use std::sync::Arc;

use chrono::NaiveDate;
use herd::{
    Animal, AnimalId, BreedConfig, BreedParameters, CohortSpec, ConceptionStatus, Herd, HerdChangeReason,
    HerdConfig, HerdEvent, HerdSimulation, MilkUse, RandomStream, Sex,
};
use proptest::prelude::*;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

fn cows(cohorts: Vec<CohortSpec>) -> Vec<BreedConfig> {
    vec![BreedConfig {
        herd_name: "Cows".to_string(),
        parameters: BreedParameters::default(),
        cohorts,
    }]
}

#[test]
fn conception_reaches_term_after_gestation() {
    let params = Arc::new(BreedParameters {
        srw_female: 400.0,
        gestation_length: 9.0,
        ..Default::default()
    });
    let mut rng = RandomStream::new(10);
    let mut herd = Herd::new();
    let cow = herd.add_animal(Animal::new(Sex::Female, params, "Cows", 36.0, 260.0), "test");

    herd.conceive(cow, 1, 1.0, 0.0, date(), &mut rng).unwrap();
    {
        let female = herd.get(cow).unwrap();
        assert!(female.is_pregnant());
        assert_eq!(female.days_pregnant(), 0.0);
        assert!(!female.is_birth_due());
    }

    for _ in 0..9 {
        herd.get_mut(cow).unwrap().increment_age();
    }
    assert!(herd.get(cow).unwrap().is_birth_due());

    let born = herd.give_birth(cow, date()).unwrap();
    assert_eq!(born.len(), 1);
    let female = herd.get(cow).unwrap();
    assert_eq!(female.carrying_count(), 0);
    assert_eq!(female.female().unwrap().number_of_offspring, 1);
    assert!(female.is_lactating());
}

#[test]
fn insufficient_mothers_leave_sucklings_unassigned() {
    let mut herd = Herd::new();
    let mut rng = RandomStream::new(1);
    let mut breeds = cows(vec![
        CohortSpec::new(Sex::Female, 30.0, 1).with_weight(300.0, 0.0),
        CohortSpec::new(Sex::Female, 40.0, 1).with_weight(300.0, 0.0),
        CohortSpec::new(Sex::Male, 2.0, 2).suckling(),
        CohortSpec::new(Sex::Female, 5.0, 1).suckling(),
    ]);
    breeds[0].parameters.minimum_age_first_mating = 12.0;
    let report = herd.initialise_cohorts(&breeds, date(), &mut rng).unwrap();

    assert_eq!(report.unassigned, 1);
    // The 40 month old cow is ID 2 and takes the first suckling.
    assert_eq!(herd.get(AnimalId(3)).unwrap().mother(), Some(AnimalId(2)));
    assert_eq!(herd.get(AnimalId(4)).unwrap().mother(), Some(AnimalId(1)));
    assert_eq!(herd.get(AnimalId(5)).unwrap().mother(), None);
}

#[test]
fn assigned_dams_conceived_no_earlier_than_mating_age() {
    let mut herd = Herd::new();
    let mut rng = RandomStream::new(3);
    let report = herd
        .initialise_cohorts(
            &cows(vec![
                CohortSpec::new(Sex::Female, 26.0, 4).with_weight(300.0, 0.0),
                CohortSpec::new(Sex::Female, 48.0, 2).with_weight(340.0, 0.0),
                CohortSpec::new(Sex::Male, 5.0, 4).suckling(),
            ]),
            date(),
            &mut rng,
        )
        .unwrap();

    assert_eq!(report.assigned + report.unassigned, 4);
    for id in herd.ids() {
        let animal = herd.get(id).unwrap();
        if let Some(mother) = animal.mother() {
            let dam = herd.get(mother).unwrap();
            assert!(dam.age() >= 48.0);
            let conceived = dam.female().unwrap().age_at_last_conception.unwrap();
            assert!(conceived >= dam.params().minimum_age_first_mating);
        }
    }
}

#[test]
fn take_milk_never_exceeds_supply() {
    let mut cow = Animal::new(Sex::Female, Arc::new(BreedParameters::default()), "Cows", 48.0, 350.0);
    cow.set_milk_production(0.2, 6.0).unwrap();
    assert_eq!(cow.take_milk(10.0, MilkUse::Suckling).unwrap(), 6.0);
    let milk = &cow.female().unwrap().milk;
    assert_eq!(milk.available, 0.0);
    assert_eq!(milk.suckled_this_step, 6.0);
}

#[test]
fn selling_a_suckling_counts_toward_weaned() {
    let mut herd = Herd::new();
    let mut rng = RandomStream::new(1);
    herd.initialise_cohorts(
        &cows(vec![
            CohortSpec::new(Sex::Female, 50.0, 1).with_weight(320.0, 0.0),
            CohortSpec::new(Sex::Male, 3.0, 1).suckling(),
        ]),
        date(),
        &mut rng,
    )
    .unwrap();
    let (mother, calf) = (AnimalId(1), AnimalId(2));
    assert_eq!(herd.get(calf).unwrap().mother(), Some(mother));

    herd.get_mut(calf).unwrap().sale_flag = HerdChangeReason::WeanerSale;
    herd.remove_animal(calf, "Sales").unwrap();

    let dam = herd.get(mother).unwrap();
    assert_eq!(dam.female().unwrap().number_of_weaned, 1);
    assert!(dam.female().unwrap().suckling_offspring().is_empty());
}

#[test]
fn herd_invariants_hold_over_a_run() {
    let config = HerdConfig {
        seed: 99,
        conception_rate: 0.2,
        ..Default::default()
    };
    let mut sim = HerdSimulation::new(&config).unwrap();

    for _ in 0..60 {
        sim.tick().unwrap();
        let mut seen = std::collections::BTreeSet::new();
        for animal in sim.herd.iter() {
            assert!(seen.insert(animal.id()));
            assert!(animal.age() >= 0.0);
            assert!(animal.highest_weight() >= animal.weight());
            if let Some(female) = animal.female() {
                assert_eq!(animal.carrying_count(), female.fetuses().len());
                assert_eq!(animal.is_pregnant(), animal.carrying_count() > 0);
                if animal.is_pregnant() {
                    assert!(animal.days_pregnant() <= animal.params().gestation_length_days() + 1e-6);
                }
                for child in female.suckling_offspring() {
                    assert_eq!(sim.herd.get(*child).unwrap().mother(), Some(animal.id()));
                }
            }
        }
    }

    let events = sim.herd.take_events();
    let births = events
        .iter()
        .filter(|e| matches!(e, HerdEvent::ConceptionStatusChanged { status: ConceptionStatus::Birth, .. }))
        .count();
    let born = events
        .iter()
        .filter(|e| matches!(e, HerdEvent::Transaction(t) if t.reason == HerdChangeReason::Born))
        .count();
    assert_eq!(births, born);
    assert!(births > 0);
}

proptest! {
    #[test]
    fn highest_weight_never_below_weight(weights in prop::collection::vec(1.0f64..800.0, 1..40)) {
        let mut cow = Animal::new(Sex::Female, Arc::new(BreedParameters::default()), "Cows", 30.0, 300.0);
        for w in weights {
            cow.set_weight(w);
            prop_assert!(cow.highest_weight() >= cow.weight());
        }
    }

    #[test]
    fn carrying_count_tracks_fetuses(seed in any::<u64>(), number in 0usize..5, steps in 0usize..12) {
        let params = Arc::new(BreedParameters {
            multiple_birth_rate: vec![0.3, 0.1],
            birth_scalar: vec![0.07, 0.055, 0.045],
            prenatal_mortality: 0.5,
            ..Default::default()
        });
        let mut rng = RandomStream::new(seed);
        let mut cow = Animal::new(Sex::Female, params, "Cows", 40.0, 350.0);
        cow.update_conception_details(number, 0.5, 0.0, date(), &mut rng).unwrap();
        for _ in 0..steps {
            cow.fetus_newborn_mortality(1.0, date(), &mut rng).unwrap();
            let state = cow.female().unwrap();
            prop_assert_eq!(cow.carrying_count(), state.fetuses().len());
            prop_assert_eq!(cow.is_pregnant(), cow.carrying_count() > 0);
            prop_assert!(cow.carrying_count() <= 3);
        }
    }
}
