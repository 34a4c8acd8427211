use std::fmt::{self, Display};

use crate::disease::DiseaseModel;
use crate::infection::date_or_never;
use crate::trajectory::Trajectory;
use crate::Day;

/// The calendar days on which an infection changes state, derived from its trajectory.
///
/// `None` means the transition never happens. Both end dates are exclusive: they name the first
/// day after the last infective (symptomatic) day.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionDates {
    pub infectious_start: Option<Day>,
    pub infectious_end: Option<Day>,
    pub symptoms_start: Option<Day>,
    pub symptoms_end: Option<Day>,
    /// Set when the first infective day is not symptomatic.
    pub asymptomatic_onset: Option<Day>,
    pub immunity_end: Option<Day>,
    /// Number of infective days without symptoms.
    pub asymptomatic_days: Day,
    /// Number of symptomatic days.
    pub symptomatic_days: Day,
    pub will_be_symptomatic: bool,
}

impl TransitionDates {
    /// Scans `trajectory` once, in day order, for an exposure on `exposure_date`.
    #[must_use]
    pub fn derive(trajectory: &Trajectory, exposure_date: Day, disease: &dyn DiseaseModel) -> Self {
        let infectivity_threshold = disease.infectivity_threshold();
        let symptomaticity_threshold = disease.symptomaticity_threshold();

        let mut dates = TransitionDates::default();
        for (offset, point) in trajectory.iter() {
            let day = exposure_date + offset;
            let infective = point.infectivity > infectivity_threshold;
            let symptomatic = point.symptomaticity > symptomaticity_threshold;
            let asymptomatic = infective && !symptomatic;

            if infective {
                if dates.infectious_start.is_none() {
                    dates.infectious_start = Some(day);
                    if asymptomatic {
                        dates.asymptomatic_onset = Some(day);
                    }
                }
                dates.infectious_end = Some(day + 1);
            }

            if symptomatic {
                if dates.symptoms_start.is_none() {
                    dates.symptoms_start = Some(day);
                    dates.will_be_symptomatic = true;
                }
                dates.symptomatic_days += 1;
                dates.symptoms_end = Some(day + 1);
            }

            if asymptomatic {
                dates.asymptomatic_days += 1;
            }
        }

        dates.immunity_end = disease
            .days_recovered()
            .and_then(|days| dates.infectious_end.map(|end| end + days));
        dates
    }
}

impl Display for TransitionDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "infectious {}, symptomatic {}, asymptomatic {}, recovered {}, unsusceptible {}",
            date_or_never(self.infectious_start),
            date_or_never(self.symptoms_start),
            date_or_never(self.symptoms_end),
            date_or_never(self.infectious_end),
            date_or_never(self.immunity_end)
        )
    }
}
