//! Shared fixtures for infection tests.
use std::sync::Arc;

use crate::disease::{AgeBand, Disease, DiseaseId, DiseaseModel, DiseaseParameters};
use crate::host::{Host, PersonId};
use crate::infection::Transition;
use crate::trajectory::Trajectory;
use crate::Day;

pub(crate) const SCENARIO_EXPOSURE: Day = 100;

/// Ten days: latent on 0-1, asymptomatic on 2-3, symptomatic on 4-6, clear on 7-9.
pub(crate) fn scenario_trajectory() -> Trajectory {
    Trajectory::new(
        vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
    )
    .unwrap()
}

pub(crate) fn scenario_parameters(days_recovered: Option<Day>) -> DiseaseParameters {
    DiseaseParameters {
        id: 0,
        name: "scenario".to_string(),
        progression: Default::default(),
        infectivity_threshold: 0.0,
        symptomaticity_threshold: 0.0,
        days_recovered,
        days_symptomatic: 3,
        immunity: Vec::new(),
        trajectories: vec![AgeBand {
            up_to: 200,
            value: scenario_trajectory(),
        }],
        case_fatality: None,
    }
}

pub(crate) fn scenario_disease(days_recovered: Option<Day>) -> Arc<dyn DiseaseModel> {
    Arc::new(Disease::new(scenario_parameters(days_recovered)).unwrap())
}

/// A host that remembers every notification it receives.
pub(crate) struct RecordingHost {
    pub real_age: f64,
    pub chronic_condition: bool,
    pub infectious: bool,
    pub notifications: Vec<Transition>,
}

impl RecordingHost {
    pub(crate) fn new(real_age: f64) -> Self {
        RecordingHost {
            real_age,
            chronic_condition: false,
            infectious: false,
            notifications: Vec::new(),
        }
    }

    pub(crate) fn count(&self, transition: Transition) -> usize {
        self.notifications
            .iter()
            .filter(|notified| **notified == transition)
            .count()
    }
}

impl Host for RecordingHost {
    fn id(&self) -> PersonId {
        PersonId(0)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn age(&self) -> u32 {
        self.real_age as u32
    }

    fn real_age(&self) -> f64 {
        self.real_age
    }

    fn has_chronic_condition(&self) -> bool {
        self.chronic_condition
    }

    fn is_infectious(&self, _disease: DiseaseId) -> bool {
        self.infectious
    }

    fn become_infectious(&mut self, _disease: DiseaseId) {
        self.infectious = true;
        self.notifications.push(Transition::Infectious);
    }

    fn become_symptomatic(&mut self, _disease: DiseaseId) {
        self.notifications.push(Transition::Symptomatic);
    }

    fn become_asymptomatic(&mut self, _disease: DiseaseId) {
        self.notifications.push(Transition::Asymptomatic);
    }

    fn recover(&mut self, _disease: DiseaseId) {
        self.infectious = false;
        self.notifications.push(Transition::Recovered);
    }

    fn become_unsusceptible(&mut self, _disease: DiseaseId) {
        self.notifications.push(Transition::Unsusceptible);
    }
}
