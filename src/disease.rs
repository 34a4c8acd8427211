//! Disease parameters consumed by the infection model.
//!
//! [`DiseaseModel`] is the interface an [`Infection`](crate::infection::Infection) queries for
//! thresholds, recovery policy, trajectory selection and fatality decisions. [`Disease`] is the
//! concrete implementation configured from JSON through [`DiseaseParameters`].
use log::trace;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::InfectionError;
use crate::host::Host;
use crate::trajectory::Trajectory;
use crate::Day;

pub type DiseaseId = usize;

/// How an infection with this disease progresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    /// Transitions are derived from the infection's trajectory.
    #[default]
    Trajectory,
    /// The host becomes infectious a few days after exposure and stays that way. The
    /// trajectory and thresholds are not consulted.
    Chronic,
}

/// What a fatality decision is based on.
#[derive(Clone, Copy)]
pub enum FatalityBasis<'a> {
    /// Only the continuous age of the host.
    Age(f64),
    /// The full host, so chronic conditions can be taken into account.
    Host(&'a dyn Host),
}

impl FatalityBasis<'_> {
    #[must_use]
    pub fn real_age(&self) -> f64 {
        match self {
            FatalityBasis::Age(age) => *age,
            FatalityBasis::Host(host) => host.real_age(),
        }
    }
}

pub trait DiseaseModel: Send + Sync {
    fn id(&self) -> DiseaseId;
    fn name(&self) -> &str;
    fn progression(&self) -> Progression;

    /// A trajectory point is infective when its infectivity exceeds this value.
    fn infectivity_threshold(&self) -> f64;
    /// A trajectory point is symptomatic when its symptomaticity exceeds this value.
    fn symptomaticity_threshold(&self) -> f64;

    /// Days between the end of the infectious period and the loss of immunity, or `None` if
    /// immunity never wanes.
    fn days_recovered(&self) -> Option<Day>;
    /// Baseline length of a symptomatic period.
    fn days_symptomatic(&self) -> Day;

    /// Whether an infection in a host of this age produces immune memory.
    fn generates_immunity(&self, real_age: f64, rng: &mut dyn RngCore) -> bool;
    /// Selects the trajectory for a host of this age. The returned curve belongs to the caller.
    fn trajectory(&self, age: u32, rng: &mut dyn RngCore) -> Option<Trajectory>;

    fn is_case_fatality_enabled(&self) -> bool;
    /// Decides whether a symptomatic host dies today.
    fn is_fatal(
        &self,
        basis: FatalityBasis<'_>,
        symptoms: f64,
        days_symptomatic: Day,
        rng: &mut dyn RngCore,
    ) -> bool;
}

/// A value that applies to every age below `up_to`. In a list of bands, the last band also
/// covers every older age.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeBand<T> {
    pub up_to: u32,
    pub value: T,
}

fn lookup_band<T>(bands: &[AgeBand<T>], age: f64) -> Option<&T> {
    bands
        .iter()
        .find(|band| age < f64::from(band.up_to))
        .or(bands.last())
        .map(|band| &band.value)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseFatalityParameters {
    /// Symptom level below which nobody dies.
    #[serde(default)]
    pub min_symptoms: f64,
    /// Daily probability of death indexed by days since symptom onset. Zero past the end.
    pub prob_by_day: Vec<f64>,
    /// Multipliers by age. Empty means 1.0 for everyone.
    #[serde(default)]
    pub age_factors: Vec<AgeBand<f64>>,
    /// Applied on top of the age factor to hosts with a chronic condition.
    #[serde(default = "default_multiplier")]
    pub chronic_condition_multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiseaseParameters {
    pub id: DiseaseId,
    pub name: String,
    #[serde(default)]
    pub progression: Progression,
    #[serde(default)]
    pub infectivity_threshold: f64,
    #[serde(default)]
    pub symptomaticity_threshold: f64,
    /// `None` or a negative value means immunity never wanes.
    #[serde(default)]
    pub days_recovered: Option<Day>,
    #[serde(default)]
    pub days_symptomatic: Day,
    /// Probability that an infection produces immune memory, by age. Empty means always.
    #[serde(default)]
    pub immunity: Vec<AgeBand<f64>>,
    #[serde(default)]
    pub trajectories: Vec<AgeBand<Trajectory>>,
    #[serde(default)]
    pub case_fatality: Option<CaseFatalityParameters>,
}

/// A disease configured from [`DiseaseParameters`].
#[derive(Clone, Debug)]
pub struct Disease {
    parameters: DiseaseParameters,
}

fn validate_probability(what: &str, value: f64) -> Result<(), InfectionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InfectionError::InvalidParameters(format!(
            "{what} must be a probability, found {value}"
        )))
    }
}

impl Disease {
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidParameters` if a threshold is not finite, a probability
    /// lies outside `[0, 1]`, or a multiplier is negative.
    pub fn new(mut parameters: DiseaseParameters) -> Result<Self, InfectionError> {
        for (what, threshold) in [
            ("infectivity_threshold", parameters.infectivity_threshold),
            (
                "symptomaticity_threshold",
                parameters.symptomaticity_threshold,
            ),
        ] {
            if !threshold.is_finite() {
                return Err(InfectionError::InvalidParameters(format!(
                    "{what} must be finite, found {threshold}"
                )));
            }
        }
        if parameters.days_symptomatic < 0 {
            return Err(InfectionError::InvalidParameters(format!(
                "days_symptomatic must not be negative, found {}",
                parameters.days_symptomatic
            )));
        }
        for band in &parameters.immunity {
            validate_probability("immunity probability", band.value)?;
        }
        if let Some(case_fatality) = &parameters.case_fatality {
            for probability in &case_fatality.prob_by_day {
                validate_probability("daily case fatality", *probability)?;
            }
            let factors = case_fatality
                .age_factors
                .iter()
                .map(|band| band.value)
                .chain([case_fatality.chronic_condition_multiplier]);
            for factor in factors {
                if !factor.is_finite() || factor < 0.0 {
                    return Err(InfectionError::InvalidParameters(format!(
                        "case fatality multipliers must be non-negative, found {factor}"
                    )));
                }
            }
        }
        parameters.days_recovered = parameters.days_recovered.filter(|days| *days >= 0);
        Ok(Disease { parameters })
    }

    #[must_use]
    pub fn parameters(&self) -> &DiseaseParameters {
        &self.parameters
    }
}

impl TryFrom<DiseaseParameters> for Disease {
    type Error = InfectionError;

    fn try_from(parameters: DiseaseParameters) -> Result<Self, Self::Error> {
        Disease::new(parameters)
    }
}

impl DiseaseModel for Disease {
    fn id(&self) -> DiseaseId {
        self.parameters.id
    }

    fn name(&self) -> &str {
        &self.parameters.name
    }

    fn progression(&self) -> Progression {
        self.parameters.progression
    }

    fn infectivity_threshold(&self) -> f64 {
        self.parameters.infectivity_threshold
    }

    fn symptomaticity_threshold(&self) -> f64 {
        self.parameters.symptomaticity_threshold
    }

    fn days_recovered(&self) -> Option<Day> {
        self.parameters.days_recovered
    }

    fn days_symptomatic(&self) -> Day {
        self.parameters.days_symptomatic
    }

    fn generates_immunity(&self, real_age: f64, rng: &mut dyn RngCore) -> bool {
        let probability = lookup_band(&self.parameters.immunity, real_age).map_or(1.0, |p| *p);
        if probability >= 1.0 {
            true
        } else if probability <= 0.0 {
            false
        } else {
            rng.random_bool(probability)
        }
    }

    fn trajectory(&self, age: u32, _rng: &mut dyn RngCore) -> Option<Trajectory> {
        let trajectory = lookup_band(&self.parameters.trajectories, f64::from(age)).cloned();
        if trajectory.is_none() {
            trace!("{} has no trajectory for age {}", self.parameters.name, age);
        }
        trajectory
    }

    fn is_case_fatality_enabled(&self) -> bool {
        self.parameters.case_fatality.is_some()
    }

    fn is_fatal(
        &self,
        basis: FatalityBasis<'_>,
        symptoms: f64,
        days_symptomatic: Day,
        rng: &mut dyn RngCore,
    ) -> bool {
        let Some(case_fatality) = &self.parameters.case_fatality else {
            return false;
        };
        if symptoms < case_fatality.min_symptoms {
            return false;
        }
        let daily = usize::try_from(days_symptomatic)
            .ok()
            .and_then(|day| case_fatality.prob_by_day.get(day))
            .copied()
            .unwrap_or(0.0);
        let age_factor =
            lookup_band(&case_fatality.age_factors, basis.real_age()).map_or(1.0, |f| *f);
        let chronic_factor = match basis {
            FatalityBasis::Host(host) if host.has_chronic_condition() => {
                case_fatality.chronic_condition_multiplier
            }
            _ => 1.0,
        };

        let probability = (daily * age_factor * chronic_factor).clamp(0.0, 1.0);
        probability > 0.0 && rng.random_bool(probability)
    }
}
