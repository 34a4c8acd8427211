//! The agent side of an infection.
//!
//! An [`Infection`](crate::infection::Infection) never owns its host. The host is handed in by
//! the caller whenever the infection needs to notify it or look something up, so this module
//! only defines the [`Host`] interface, the identity types an infection keeps, and [`Person`], a
//! straightforward host used by the runner and in tests.
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::disease::DiseaseId;
use crate::hashing::HashMap;
use crate::trajectory::StrainId;
use crate::Day;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub usize);

impl Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PlaceId = usize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSubtype {
    #[default]
    None,
    College,
    Prison,
    NursingHome,
    MilitaryBase,
}

impl PlaceSubtype {
    /// Single letter used in infection reports.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            PlaceSubtype::None => 'X',
            PlaceSubtype::College => 'D',
            PlaceSubtype::Prison => 'J',
            PlaceSubtype::NursingHome => 'L',
            PlaceSubtype::MilitaryBase => 'B',
        }
    }
}

/// Identity of the place where an infection happened, as seen at the moment of exposure.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceRef {
    pub id: PlaceId,
    /// Single letter place type (`H`ousehold, `S`chool, `W`orkplace, ...).
    pub kind: char,
    #[serde(default)]
    pub subtype: PlaceSubtype,
    pub size: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// A household location.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub census_tract: Option<i64>,
}

/// An episode the host has recovered from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastInfection {
    pub strain: StrainId,
    pub recovery_date: Day,
    pub age_at_exposure: u32,
}

pub trait Host {
    fn id(&self) -> PersonId;
    /// Age in whole years.
    fn age(&self) -> u32;
    /// Continuous age in years.
    fn real_age(&self) -> f64;

    fn has_chronic_condition(&self) -> bool {
        false
    }

    /// Planar coordinates used for infector distance.
    fn position(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn household(&self) -> Option<Location> {
        None
    }

    /// The household a hospitalized host returns to.
    fn permanent_household(&self) -> Option<Location> {
        None
    }

    fn is_hospitalized(&self) -> bool {
        false
    }

    fn is_infectious(&self, disease: DiseaseId) -> bool;

    fn become_infectious(&mut self, disease: DiseaseId);
    fn become_symptomatic(&mut self, disease: DiseaseId);
    fn become_asymptomatic(&mut self, disease: DiseaseId);
    fn recover(&mut self, disease: DiseaseId);
    fn become_unsusceptible(&mut self, disease: DiseaseId);

    fn num_past_infections(&self, _disease: DiseaseId) -> usize {
        0
    }

    fn past_infection(&self, _disease: DiseaseId, _index: usize) -> Option<&PastInfection> {
        None
    }
}

/// Per-disease health flags of a [`Person`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HealthState {
    pub infectious: bool,
    pub symptomatic: bool,
    pub recovered: bool,
    pub unsusceptible: bool,
}

#[derive(Clone, Debug)]
pub struct Person {
    id: PersonId,
    real_age: f64,
    chronic_condition: bool,
    position: (f64, f64),
    household: Option<Location>,
    alive: bool,
    health: HashMap<DiseaseId, HealthState>,
    past_infections: HashMap<DiseaseId, Vec<PastInfection>>,
}

impl Person {
    #[must_use]
    pub fn new(id: PersonId, real_age: f64) -> Self {
        Person {
            id,
            real_age,
            chronic_condition: false,
            position: (0.0, 0.0),
            household: None,
            alive: true,
            health: HashMap::default(),
            past_infections: HashMap::default(),
        }
    }

    #[must_use]
    pub fn with_chronic_condition(mut self, chronic_condition: bool) -> Self {
        self.chronic_condition = chronic_condition;
        self
    }

    #[must_use]
    pub fn with_household(mut self, household: Location) -> Self {
        self.household = Some(household);
        self
    }

    #[must_use]
    pub fn at_position(mut self, x: f64, y: f64) -> Self {
        self.position = (x, y);
        self
    }

    #[must_use]
    pub fn health(&self, disease: DiseaseId) -> HealthState {
        self.health.get(&disease).copied().unwrap_or_default()
    }

    pub fn add_past_infection(&mut self, disease: DiseaseId, past_infection: PastInfection) {
        self.past_infections
            .entry(disease)
            .or_default()
            .push(past_infection);
    }

    pub fn die(&mut self) {
        self.alive = false;
        for state in self.health.values_mut() {
            state.infectious = false;
            state.symptomatic = false;
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn health_mut(&mut self, disease: DiseaseId) -> &mut HealthState {
        self.health.entry(disease).or_default()
    }
}

impl Host for Person {
    fn id(&self) -> PersonId {
        self.id
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn age(&self) -> u32 {
        self.real_age.max(0.0).floor() as u32
    }

    fn real_age(&self) -> f64 {
        self.real_age
    }

    fn has_chronic_condition(&self) -> bool {
        self.chronic_condition
    }

    fn position(&self) -> (f64, f64) {
        self.position
    }

    fn household(&self) -> Option<Location> {
        self.household
    }

    fn is_infectious(&self, disease: DiseaseId) -> bool {
        self.health(disease).infectious
    }

    fn become_infectious(&mut self, disease: DiseaseId) {
        self.health_mut(disease).infectious = true;
    }

    fn become_symptomatic(&mut self, disease: DiseaseId) {
        self.health_mut(disease).symptomatic = true;
    }

    fn become_asymptomatic(&mut self, disease: DiseaseId) {
        self.health_mut(disease).symptomatic = false;
    }

    fn recover(&mut self, disease: DiseaseId) {
        let state = self.health_mut(disease);
        state.infectious = false;
        state.symptomatic = false;
        state.recovered = true;
    }

    fn become_unsusceptible(&mut self, disease: DiseaseId) {
        self.health_mut(disease).unsusceptible = true;
    }

    fn num_past_infections(&self, disease: DiseaseId) -> usize {
        self.past_infections.get(&disease).map_or(0, Vec::len)
    }

    fn past_infection(&self, disease: DiseaseId, index: usize) -> Option<&PastInfection> {
        self.past_infections
            .get(&disease)
            .and_then(|past| past.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_is_truncated() {
        let person = Person::new(PersonId(0), 41.9);
        assert_eq!(person.age(), 41);
        assert_eq!(person.real_age(), 41.9);
    }

    #[test]
    fn notifications_update_health_state() {
        let mut person = Person::new(PersonId(3), 20.0);
        person.become_infectious(1);
        person.become_symptomatic(1);
        assert!(person.is_infectious(1));
        assert!(!person.is_infectious(0));
        assert!(person.health(1).symptomatic);

        person.become_asymptomatic(1);
        assert!(!person.health(1).symptomatic);

        person.recover(1);
        assert_eq!(
            person.health(1),
            HealthState {
                infectious: false,
                symptomatic: false,
                recovered: true,
                unsusceptible: false,
            }
        );
    }

    #[test]
    fn past_infections_are_kept_per_disease() {
        let mut person = Person::new(PersonId(0), 5.0);
        let past = PastInfection {
            strain: 2,
            recovery_date: 17,
            age_at_exposure: 5,
        };
        person.add_past_infection(0, past);
        assert_eq!(person.num_past_infections(0), 1);
        assert_eq!(person.num_past_infections(1), 0);
        assert_eq!(person.past_infection(0, 0), Some(&past));
        assert_eq!(person.past_infection(0, 1), None);
    }

    #[test]
    fn dead_people_stop_being_infectious() {
        let mut person = Person::new(PersonId(0), 80.0);
        person.become_infectious(0);
        person.die();
        assert!(!person.is_alive());
        assert!(!person.is_infectious(0));
    }

    #[test]
    fn subtype_codes() {
        assert_eq!(PlaceSubtype::None.code(), 'X');
        assert_eq!(PlaceSubtype::NursingHome.code(), 'L');
    }
}
