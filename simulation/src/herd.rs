//! Herd manager: the single owner of every live animal.
//!
//! Animals live in a hecs `World`, one `Animal` component per entity, with an
//! ID index kept in ID order so every pass over the herd is deterministic.
//! Mother and offspring refer to each other by [`AnimalId`], so removing an
//! animal only clears IDs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use hecs::{Entity, Ref, World};
use serde::Serialize;
use tracing::debug;

use crate::animal::Animal;
use crate::components::{AnimalClass, AnimalId, HerdChangeReason, Sex};
use crate::error::{HerdError, Result};
use crate::events::{BreedingStats, ConceptionStatus, HerdEvent, Transaction, TransactionKind};
use crate::random::RandomStream;

/// Totals for one reporting class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassSummary {
    pub count: usize,
    pub total_weight: f64,
    pub total_adult_equivalent: f64,
}

pub struct Herd {
    world: World,
    index: BTreeMap<AnimalId, Entity>,
    next_id: u64,
    events: Vec<HerdEvent>,
}

impl Herd {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            index: BTreeMap::new(),
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Hand out the next ID. IDs start at 1 and are never reused.
    pub fn next_unique_id(&mut self) -> AnimalId {
        let id = AnimalId(self.next_id);
        self.next_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Population changes
    // ------------------------------------------------------------------

    /// Insert an animal, assigning an ID if it has none. The pending sale flag
    /// is the reason recorded on the gain transaction and is then cleared.
    pub fn add_animal(&mut self, mut animal: Animal, actor: &str) -> AnimalId {
        if !animal.id.is_assigned() || self.index.contains_key(&animal.id) {
            animal.id = self.next_unique_id();
        } else {
            self.next_id = self.next_id.max(animal.id.0 + 1);
        }
        let id = animal.id;
        let reason = animal.sale_flag;
        let herd_name = animal.herd_name().to_string();
        animal.sale_flag = HerdChangeReason::None;

        debug!(
            "Added {:?} {:?} to [{}] age {:.1} weight {:.1} ({:?})",
            id,
            animal.sex(),
            herd_name,
            animal.age(),
            animal.weight(),
            reason
        );

        let entity = self.world.spawn((animal,));
        self.index.insert(id, entity);
        self.events.push(HerdEvent::Transaction(Transaction {
            kind: TransactionKind::Gain,
            amount: 1,
            reason,
            animal: id,
            herd_name,
            actor: actor.to_string(),
        }));
        id
    }

    /// Take an animal out of the herd. Its sale flag is the recorded reason.
    ///
    /// Nursing offspring of a removed female lose their mother link. An unweaned
    /// animal leaving for any reason other than death counts as weaned for its
    /// mother's lifetime statistics.
    pub fn remove_animal(&mut self, id: AnimalId, actor: &str) -> Result<Animal> {
        let entity = self.index.remove(&id).ok_or(HerdError::AnimalNotFound(id))?;
        let mut animal = self
            .world
            .remove_one::<Animal>(entity)
            .map_err(|_| HerdError::AnimalNotFound(id))?;
        self.world
            .despawn(entity)
            .map_err(|_| HerdError::AnimalNotFound(id))?;

        if let Some(female) = animal.female_mut() {
            for child in female.suckling_offspring.drain(..) {
                if let Some(orphan) = self.get_mut(child) {
                    orphan.mother = None;
                }
            }
        }

        if let Some(mother_id) = animal.mother.take() {
            let counts_as_weaned = !animal.is_weaned() && !animal.sale_flag.is_death();
            if let Some(mother) = self.get_mut(mother_id).and_then(Animal::female_mut) {
                mother.remove_suckling(id);
                if counts_as_weaned {
                    mother.number_of_weaned += 1;
                }
            }
        }

        debug!(
            "Removed {:?} from [{}] ({:?})",
            id,
            animal.herd_name(),
            animal.sale_flag
        );
        self.events.push(HerdEvent::Transaction(Transaction {
            kind: TransactionKind::Loss,
            amount: 1,
            reason: animal.sale_flag,
            animal: id,
            herd_name: animal.herd_name().to_string(),
            actor: actor.to_string(),
        }));
        if let Some(stats) = breeding_stats(&animal) {
            self.events.push(HerdEvent::FinalFemaleBreedingStats(stats));
        }
        Ok(animal)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn get(&self, id: AnimalId) -> Option<Ref<'_, Animal>> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&Animal>(entity).ok()
    }

    pub fn get_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        let entity = *self.index.get(&id)?;
        self.world.query_one_mut::<&mut Animal>(entity).ok()
    }

    pub fn contains(&self, id: AnimalId) -> bool {
        self.index.contains_key(&id)
    }

    /// Live IDs in ascending order.
    pub fn ids(&self) -> Vec<AnimalId> {
        self.index.keys().copied().collect()
    }

    /// Every live animal, in no particular order.
    pub fn animals_mut(&mut self) -> impl Iterator<Item = &mut Animal> + '_ {
        self.world
            .query_mut::<&mut Animal>()
            .into_iter()
            .map(|(_, animal)| animal)
    }

    /// Live animals in ID order.
    pub fn iter(&self) -> impl Iterator<Item = Ref<'_, Animal>> + '_ {
        self.index
            .values()
            .filter_map(|entity| self.world.get::<&Animal>(*entity).ok())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // ------------------------------------------------------------------
    // Reproduction
    // ------------------------------------------------------------------

    /// Wean an animal. Returns false if it was already weaned.
    pub fn wean(&mut self, id: AnimalId, report: bool, reason: &str, date: NaiveDate) -> Result<bool> {
        let animal = self.get_mut(id).ok_or(HerdError::AnimalNotFound(id))?;
        if animal.is_weaned() {
            return Ok(false);
        }
        animal.set_weaned(true);
        let mother_id = animal.mother();

        if let Some(mother) = mother_id.and_then(|m| self.get_mut(m)).and_then(Animal::female_mut) {
            mother.remove_suckling(id);
            mother.number_of_weaned += 1;
        }
        debug!("Weaned {:?} ({})", id, reason);
        if report {
            self.events.push(HerdEvent::WeanOccurred {
                animal: id,
                reason: reason.to_string(),
                date,
            });
        }
        Ok(true)
    }

    /// Record a conception on a female and raise `Conceived`.
    pub fn conceive(
        &mut self,
        id: AnimalId,
        number: usize,
        rate: f64,
        age_offset: f64,
        date: NaiveDate,
        rng: &mut RandomStream,
    ) -> Result<()> {
        let female = self.get_mut(id).ok_or(HerdError::AnimalNotFound(id))?;
        female.update_conception_details(number, rate, age_offset, date, rng)?;
        if female.is_pregnant() {
            debug!("{:?} conceived {} at rate {:.3}", id, female.carrying_count(), rate);
            self.events.push(HerdEvent::ConceptionStatusChanged {
                animal: id,
                status: ConceptionStatus::Conceived,
                offspring: None,
                date,
            });
        }
        Ok(())
    }

    /// Per-step fetal loss for one female, raising `Failed` if the pregnancy ends.
    pub fn fetus_newborn_mortality(
        &mut self,
        id: AnimalId,
        step_months: f64,
        date: NaiveDate,
        rng: &mut RandomStream,
    ) -> Result<Option<ConceptionStatus>> {
        let female = self.get_mut(id).ok_or(HerdError::AnimalNotFound(id))?;
        let status = female.fetus_newborn_mortality(step_months, date, rng)?;
        if let Some(status) = status {
            debug!("{:?} lost pregnancy", id);
            self.events.push(HerdEvent::ConceptionStatusChanged {
                animal: id,
                status,
                offspring: None,
                date,
            });
        }
        Ok(status)
    }

    /// Deliver every fetus the female carries as a new unweaned animal linked
    /// to her. Returns the newborn IDs.
    pub fn give_birth(&mut self, id: AnimalId, date: NaiveDate) -> Result<Vec<AnimalId>> {
        let (litter, params, herd_name, inherited) = {
            let mother = self.get(id).ok_or(HerdError::AnimalNotFound(id))?;
            let inherited: Vec<_> = mother
                .inheritable_attributes()
                .map(|(name, attribute)| (name.clone(), attribute.clone()))
                .collect();
            (
                mother.birth_weights()?,
                mother.shared_params(),
                mother.herd_name().to_string(),
                inherited,
            )
        };

        let mut born = Vec::with_capacity(litter.len());
        for (sex, weight) in litter {
            let mut calf = Animal::newborn(sex, Arc::clone(&params), herd_name.as_str(), weight);
            calf.mother = Some(id);
            calf.sale_flag = HerdChangeReason::Born;
            calf.attributes.extend(inherited.iter().cloned());
            let calf_id = self.add_animal(calf, "Breeding");

            if let Some(mother) = self.get_mut(id).and_then(Animal::female_mut) {
                mother.add_suckling(calf_id);
            }
            self.events.push(HerdEvent::ConceptionStatusChanged {
                animal: id,
                status: ConceptionStatus::Birth,
                offspring: Some(calf_id),
                date,
            });
            born.push(calf_id);
        }

        if let Some(mother) = self.get_mut(id) {
            mother.complete_birth(date)?;
        }
        debug!("{:?} gave birth to {} offspring", id, born.len());
        Ok(born)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    /// Live herd grouped by reporting class.
    pub fn summary(&self) -> BTreeMap<AnimalClass, ClassSummary> {
        let mut summary: BTreeMap<AnimalClass, ClassSummary> = BTreeMap::new();
        for animal in self.iter() {
            let entry = summary.entry(animal.class()).or_default();
            entry.count += 1;
            entry.total_weight += animal.weight();
            entry.total_adult_equivalent += animal.adult_equivalent();
        }
        summary
    }

    pub fn count_by_sex(&self, sex: Sex) -> usize {
        self.iter().filter(|animal| animal.sex() == sex).count()
    }

    /// Report final breeding statistics for every qualifying female, then empty
    /// the herd.
    pub fn end_of_simulation(&mut self) {
        let stats: Vec<BreedingStats> = self.iter().filter_map(|animal| breeding_stats(&animal)).collect();
        self.events
            .extend(stats.into_iter().map(HerdEvent::FinalFemaleBreedingStats));
        self.clear();
    }

    pub fn events(&self) -> &[HerdEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HerdEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop every animal. The ID counter keeps running.
    pub fn clear(&mut self) {
        self.world.clear();
        self.index.clear();
    }
}

impl Default for Herd {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifetime record for females old enough to have bred.
fn breeding_stats(animal: &Animal) -> Option<BreedingStats> {
    let female = animal.female()?;
    if animal.age() < animal.params().minimum_age_first_mating {
        return None;
    }
    Some(BreedingStats {
        animal: animal.id(),
        herd_name: animal.herd_name().to_string(),
        age: animal.age(),
        number_of_conceptions: female.number_of_conceptions,
        number_of_births: female.number_of_births,
        number_of_offspring: female.number_of_offspring,
        number_of_weaned: female.number_of_weaned,
        previous_conception_rate: female.previous_conception_rate,
    })
}
