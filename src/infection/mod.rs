//! A single disease episode in a single host.
//!
//! An [`Infection`] owns the trajectory selected for its host at exposure and derives from it
//! the calendar days on which the host becomes infectious, develops and loses symptoms, recovers
//! and loses immunity ([`TransitionDates`]). Every change to the trajectory, whether from an
//! intervention, a mutation, or a shift of a seed infection, is followed by a full re-derivation
//! so the dates always describe the current curve.
//!
//! Each simulated day the caller invokes [`Infection::update`], which notifies the host of every
//! transition that falls on that day exactly once and decides whether the episode turns fatal.
mod modify;
mod transition_dates;
mod update;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use log::{debug, trace};
use rand::RngCore;
use serde::Serialize;

use crate::disease::{DiseaseId, DiseaseModel, Progression};
use crate::error::InfectionError;
use crate::host::{Host, PastInfection, PersonId, PlaceRef};
use crate::settings::SimulationSettings;
use crate::trajectory::{StrainId, Trajectory, DEFAULT_STRAIN};
use crate::Day;

pub use modify::MAX_MODIFIED_DAYS;
pub use transition_dates::TransitionDates;
pub use update::CHRONIC_LATENT_DAYS;

/// A change in the host's observable disease state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Infectious,
    Symptomatic,
    Asymptomatic,
    Recovered,
    Unsusceptible,
}

impl Transition {
    /// Name used for the event column of the infection report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Transition::Infectious => "infectious",
            Transition::Symptomatic => "symptomatic",
            Transition::Asymptomatic => "asymptomatic",
            Transition::Recovered => "recovered",
            Transition::Unsusceptible => "unsusceptible",
        }
    }

    pub(crate) fn notify(self, host: &mut dyn Host, disease: DiseaseId) {
        match self {
            Transition::Infectious => host.become_infectious(disease),
            Transition::Symptomatic => host.become_symptomatic(disease),
            Transition::Asymptomatic => host.become_asymptomatic(disease),
            Transition::Recovered => host.recover(disease),
            Transition::Unsusceptible => host.become_unsusceptible(disease),
        }
    }
}

/// Writes an unset date with the `-1` sentinel used in text output.
pub(crate) fn date_or_never(date: Option<Day>) -> i64 {
    date.map_or(-1, i64::from)
}

pub struct Infection {
    disease: Arc<dyn DiseaseModel>,
    progression: Progression,
    infector: Option<PersonId>,
    host: PersonId,
    place: Option<PlaceRef>,
    infectee_count: usize,

    infectivity: f64,
    symptoms: f64,
    infectivity_multp: f64,
    susceptibility: f64,
    immune_response: bool,
    is_susceptible: bool,
    fatal_today: bool,

    exposure_date: Day,
    dates: TransitionDates,
    trajectory: Trajectory,
}

impl Infection {
    /// Creates the infection of `host` exposed on `day` and derives its transition dates.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::PreconditionViolation` if the disease has no trajectory for the
    /// host's age.
    pub fn new(
        disease: Arc<dyn DiseaseModel>,
        infector: Option<PersonId>,
        host: &dyn Host,
        place: Option<PlaceRef>,
        day: Day,
        rng: &mut dyn RngCore,
    ) -> Result<Self, InfectionError> {
        let immune_response = disease.generates_immunity(host.real_age(), rng);
        let trajectory = disease.trajectory(host.age(), rng).ok_or_else(|| {
            InfectionError::PreconditionViolation(format!(
                "no {} trajectory for person {} aged {}",
                disease.name(),
                host.id(),
                host.age()
            ))
        })?;

        let mut infection = Infection {
            progression: disease.progression(),
            disease,
            infector,
            host: host.id(),
            place,
            infectee_count: 0,
            infectivity: 0.0,
            symptoms: 0.0,
            infectivity_multp: 1.0,
            susceptibility: 0.0,
            immune_response,
            is_susceptible: true,
            fatal_today: false,
            exposure_date: day,
            dates: TransitionDates::default(),
            trajectory,
        };
        infection.set_transition_dates();
        Ok(infection)
    }

    /// Re-derives every transition date from the current trajectory. Idempotent.
    pub fn set_transition_dates(&mut self) {
        self.dates = TransitionDates::derive(
            &self.trajectory,
            self.exposure_date,
            self.disease.as_ref(),
        );
        trace!("person {}: {}", self.host, self.dates);
    }

    /// Replaces the trajectory and re-derives the transition dates.
    pub fn set_trajectory(&mut self, trajectory: Trajectory) {
        self.trajectory = trajectory;
        self.set_transition_dates();
    }

    #[must_use]
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    #[must_use]
    pub fn disease(&self) -> &dyn DiseaseModel {
        self.disease.as_ref()
    }

    #[must_use]
    pub fn disease_id(&self) -> DiseaseId {
        self.disease.id()
    }

    #[must_use]
    pub fn host(&self) -> PersonId {
        self.host
    }

    #[must_use]
    pub fn infector(&self) -> Option<PersonId> {
        self.infector
    }

    #[must_use]
    pub fn place(&self) -> Option<&PlaceRef> {
        self.place.as_ref()
    }

    #[must_use]
    pub fn dates(&self) -> &TransitionDates {
        &self.dates
    }

    #[must_use]
    pub fn exposure_date(&self) -> Day {
        self.exposure_date
    }

    #[must_use]
    pub fn infectious_start_date(&self) -> Option<Day> {
        self.dates.infectious_start
    }

    #[must_use]
    pub fn infectious_end_date(&self) -> Option<Day> {
        self.dates.infectious_end
    }

    #[must_use]
    pub fn symptoms_start_date(&self) -> Option<Day> {
        self.dates.symptoms_start
    }

    #[must_use]
    pub fn symptoms_end_date(&self) -> Option<Day> {
        self.dates.symptoms_end
    }

    #[must_use]
    pub fn asymptomatic_date(&self) -> Option<Day> {
        self.dates.asymptomatic_onset
    }

    #[must_use]
    pub fn immunity_end_date(&self) -> Option<Day> {
        self.dates.immunity_end
    }

    /// The day the host stops being protected by this episode.
    #[must_use]
    pub fn unsusceptible_date(&self) -> Option<Day> {
        self.dates.immunity_end
    }

    #[must_use]
    pub fn will_be_symptomatic(&self) -> bool {
        self.dates.will_be_symptomatic
    }

    #[must_use]
    pub fn asymptomatic_period(&self) -> Day {
        self.dates.asymptomatic_days
    }

    #[must_use]
    pub fn symptomatic_period(&self) -> Day {
        self.dates.symptomatic_days
    }

    /// Infectivity on `day`, scaled by the infectivity multiplier. Reads the trajectory, not the
    /// value cached by the last update.
    #[must_use]
    pub fn get_infectivity(&self, day: Day) -> f64 {
        self.trajectory.point(day - self.exposure_date).infectivity * self.infectivity_multp
    }

    /// Symptom severity on `day`. The infectivity multiplier does not apply.
    #[must_use]
    pub fn get_symptoms(&self, day: Day) -> f64 {
        self.trajectory.point(day - self.exposure_date).symptomaticity
    }

    /// Infectivity cached by the last update.
    #[must_use]
    pub fn infectivity(&self) -> f64 {
        self.infectivity
    }

    /// Symptom severity cached by the last update.
    #[must_use]
    pub fn symptoms(&self) -> f64 {
        self.symptoms
    }

    #[must_use]
    pub fn is_infectious(&self) -> bool {
        self.infectivity > self.disease.infectivity_threshold()
    }

    #[must_use]
    pub fn is_symptomatic(&self) -> bool {
        self.symptoms > self.disease.symptomaticity_threshold()
    }

    #[must_use]
    pub fn infectivity_multiplier(&self) -> f64 {
        self.infectivity_multp
    }

    pub fn set_infectivity_multiplier(&mut self, multp: f64) {
        self.infectivity_multp = multp;
    }

    #[must_use]
    pub fn susceptibility(&self) -> f64 {
        self.susceptibility
    }

    pub fn set_susceptibility(&mut self, susceptibility: f64) {
        self.susceptibility = susceptibility;
    }

    /// Whether this episode leaves the host with immune memory.
    #[must_use]
    pub fn provides_immunity(&self) -> bool {
        self.immune_response
    }

    /// False once the host has lost the immunity from this episode.
    #[must_use]
    pub fn is_susceptible(&self) -> bool {
        self.is_susceptible
    }

    #[must_use]
    pub fn is_fatal_today(&self) -> bool {
        self.fatal_today
    }

    #[must_use]
    pub fn infectee_count(&self) -> usize {
        self.infectee_count
    }

    /// Records that this infection was passed on to someone else. Returns the new count.
    pub fn add_infectee(&mut self) -> usize {
        self.infectee_count += 1;
        self.infectee_count
    }

    /// Moves the exposure of a seed infection `days` into the past and notifies the host of every
    /// transition that has already happened by the epidemic start.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::PreconditionViolation` if the infection never ends, which means it
    /// is not a fully dated seed infection.
    pub fn advance_seed_infection(
        &mut self,
        days: Day,
        host: &mut dyn Host,
        settings: &SimulationSettings,
    ) -> Result<Vec<Transition>, InfectionError> {
        if self.dates.infectious_end.is_none() {
            return Err(InfectionError::PreconditionViolation(format!(
                "cannot advance infection of person {}: it is not fully dated",
                self.host
            )));
        }
        self.exposure_date -= days;
        self.set_transition_dates();

        let baseline = settings.epidemic_offset;
        let candidates = [
            (self.dates.infectious_start, Transition::Infectious),
            (self.dates.symptoms_start, Transition::Symptomatic),
            (self.dates.infectious_end, Transition::Recovered),
            (self.dates.immunity_end, Transition::Unsusceptible),
        ];
        let mut fired = Vec::new();
        for (date, transition) in candidates {
            if date.is_some_and(|date| date <= baseline) {
                self.fire(transition, host);
                fired.push(transition);
            }
        }
        debug!(
            "advanced seed infection of person {} by {} days: {:?}",
            self.host, days, fired
        );
        Ok(fired)
    }

    pub(crate) fn fire(&mut self, transition: Transition, host: &mut dyn Host) {
        transition.notify(host, self.disease.id());
        if transition == Transition::Unsusceptible {
            self.is_susceptible = false;
        }
    }

    /// Every strain that has appeared in this infection.
    #[must_use]
    pub fn strains(&self) -> Vec<StrainId> {
        self.trajectory.strains()
    }

    /// The strain carrying the most infectivity over the whole episode.
    #[must_use]
    pub fn dominant_strain(&self) -> StrainId {
        let total = |strain: StrainId| -> f64 {
            (0..self.trajectory.duration())
                .map(|offset| self.trajectory.strain_infectivity(strain, offset))
                .sum()
        };
        self.strains()
            .into_iter()
            .map(|strain| (strain, total(strain)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(DEFAULT_STRAIN, |(strain, _)| strain)
    }

    /// Records that from `day` on, `old_strain` has been replaced by `new_strain`.
    pub fn mutate(&mut self, old_strain: StrainId, new_strain: StrainId, day: Day) {
        self.trajectory
            .mutate(old_strain, new_strain, day - self.exposure_date);
        self.set_transition_dates();
        debug!(
            "person {}: strain {} mutated into {} on day {}",
            self.host, old_strain, new_strain, day
        );
    }

    #[must_use]
    pub fn num_past_infections(&self, host: &dyn Host) -> usize {
        host.num_past_infections(self.disease.id())
    }

    #[must_use]
    pub fn past_infection<'h>(&self, host: &'h dyn Host, index: usize) -> Option<&'h PastInfection> {
        host.past_infection(self.disease.id(), index)
    }

    /// The record a host keeps of this episode once it has recovered.
    #[must_use]
    pub fn past_infection_record(&self, host: &dyn Host, recovery_date: Day) -> PastInfection {
        PastInfection {
            strain: self.dominant_strain(),
            recovery_date,
            age_at_exposure: host.age(),
        }
    }
}

impl Debug for Infection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Infection")
            .field("disease", &self.disease.name())
            .field("host", &self.host)
            .field("infector", &self.infector)
            .field("exposure_date", &self.exposure_date)
            .field("dates", &self.dates)
            .finish_non_exhaustive()
    }
}

impl Display for Infection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "infection of disease {} in person {}: exposed {}, {}, will be symptomatic {}, \
             susceptibility {:.3}, infectivity {:.3} (x{:.3}), symptoms {:.3}",
            self.disease.id(),
            self.host,
            self.exposure_date,
            self.dates,
            self.dates.will_be_symptomatic,
            self.susceptibility,
            self.infectivity,
            self.infectivity_multp,
            self.symptoms
        )
    }
}
