//! Interventions that reshape an infection's course.
//!
//! Every operation checks its arguments before touching anything, so a rejected call leaves the
//! infection unchanged, and every accepted call ends with a full re-derivation of the dates.
use log::{debug, warn};

use crate::error::InfectionError;
use crate::infection::Infection;
use crate::Day;

/// Longest period a modification may produce.
pub const MAX_MODIFIED_DAYS: Day = 3_650;

fn check_multiplier(multp: f64) -> Result<(), InfectionError> {
    if multp.is_finite() && multp >= 0.0 {
        Ok(())
    } else {
        Err(InfectionError::InvalidOperation(format!(
            "cannot modify: invalid multiplier {multp}"
        )))
    }
}

/// Scales a day count, dropping any fractional day. `None` past [`MAX_MODIFIED_DAYS`].
#[allow(clippy::cast_possible_truncation)]
fn scale(days: Day, multp: f64) -> Option<Day> {
    let scaled = (f64::from(days) * multp).floor();
    (scaled <= f64::from(MAX_MODIFIED_DAYS)).then_some(scaled as Day)
}

impl Infection {
    fn rejected(&self, reason: &str, today: Day) -> InfectionError {
        warn!(
            "day {}: rejected modification for person {}: {}",
            today, self.host, reason
        );
        InfectionError::InvalidOperation(format!("cannot modify: {reason}"))
    }

    /// Scales `[start, end)` of the course by `multp` and shifts the rest of the curve with it.
    /// `minimum` is the fewest days the span may keep.
    fn scale_span(
        &mut self,
        start: Day,
        end: Day,
        multp: f64,
        minimum: Day,
        today: Day,
    ) -> Result<(), InfectionError> {
        let span = end - start;
        let Some(days) = scale(span, multp) else {
            let reason = format!("{span} days scaled by {multp} exceed {MAX_MODIFIED_DAYS} days");
            return Err(self.rejected(&reason, today));
        };
        self.trajectory.resize_span(
            start - self.exposure_date,
            end - self.exposure_date,
            days.max(minimum),
        );
        self.set_transition_dates();
        Ok(())
    }

    /// Scales the symptomatic period by `multp`. Before symptom onset the whole symptomatic span
    /// is scaled; afterwards only the symptomatic days left, starting today. Once symptoms are
    /// over the days left until recovery are scaled instead. Infective days outside the scaled
    /// span keep their length and move with its end.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidOperation` if `multp` is negative, the scaled span would
    /// be longer than [`MAX_MODIFIED_DAYS`], or the infection has already ended by `today`.
    pub fn modify_symptomatic_period(&mut self, multp: f64, today: Day) -> Result<(), InfectionError> {
        check_multiplier(multp)?;
        let Some(infectious_end) = self.dates.infectious_end.filter(|end| today < *end) else {
            return Err(self.rejected("past symptomatic period", today));
        };

        let dates = self.dates;
        match (dates.symptoms_start, dates.symptoms_end) {
            (Some(symptoms_start), Some(symptoms_end)) if today < symptoms_start => {
                self.scale_span(symptoms_start, symptoms_end, multp, 0, today)?;
            }
            // Keep at least today so the new end is still ahead of the update.
            (_, Some(symptoms_end)) if today < symptoms_end => {
                self.scale_span(today, symptoms_end, multp, 1, today)?;
            }
            _ => self.scale_span(today, infectious_end, multp, 1, today)?,
        }
        debug!(
            "day {}: symptomatic period of person {} scaled by {}",
            today, self.host, multp
        );
        Ok(())
    }

    /// Scales the span from the first infective day to symptom onset by `multp`, or only the
    /// part left of it once the host is infective. Symptoms move with the end of the span.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidOperation` if `multp` is negative, the scaled span would
    /// be longer than [`MAX_MODIFIED_DAYS`], or symptoms have already started (or never will)
    /// by `today`.
    pub fn modify_asymptomatic_period(
        &mut self,
        multp: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        check_multiplier(multp)?;
        let Some(symptoms_start) = self.dates.symptoms_start.filter(|start| today < *start) else {
            return Err(self.rejected("past asymptomatic period", today));
        };

        let start = match self.dates.infectious_start {
            Some(infectious_start) if today < infectious_start => {
                infectious_start.min(symptoms_start)
            }
            _ => today,
        };
        self.scale_span(start, symptoms_start, multp, 0, today)?;
        debug!(
            "day {}: asymptomatic period of person {} scaled by {}",
            today, self.host, multp
        );
        Ok(())
    }

    /// Scales the whole infectious period: the part before symptom onset, if it is still ahead,
    /// and the symptomatic part. Either both legs apply or neither does.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidOperation` if `multp` is negative or either leg is
    /// rejected.
    pub fn modify_infectious_period(&mut self, multp: f64, today: Day) -> Result<(), InfectionError> {
        check_multiplier(multp)?;
        let checkpoint = (self.trajectory.clone(), self.dates);

        if self
            .dates
            .symptoms_start
            .is_some_and(|symptoms_start| today < symptoms_start)
        {
            self.modify_asymptomatic_period(multp, today)?;
        }
        if let Err(error) = self.modify_symptomatic_period(multp, today) {
            (self.trajectory, self.dates) = checkpoint;
            return Err(error);
        }
        Ok(())
    }

    /// Makes the infection develop symptoms (or not). Forced symptoms last the disease's
    /// baseline symptomatic period.
    ///
    /// Forbidding symptoms clears them from today on. Days already symptomatic stay in the
    /// curve, so after onset the infection keeps `will_be_symptomatic` and repeating the call
    /// changes nothing further.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidOperation` if the infection has ended by `today`, or if
    /// symptom onset has passed for an infection without an asymptomatic phase.
    pub fn modify_develops_symptoms(
        &mut self,
        symptoms: bool,
        today: Day,
    ) -> Result<(), InfectionError> {
        let past_onset = self
            .dates
            .symptoms_start
            .is_none_or(|symptoms_start| today >= symptoms_start);
        let past_end = self
            .dates
            .infectious_end
            .is_none_or(|infectious_end| today >= infectious_end);
        if (past_onset && self.dates.asymptomatic_onset.is_none()) || past_end {
            return Err(self.rejected("past symptomatic period", today));
        }

        if self.dates.will_be_symptomatic != symptoms {
            let (start, days) = if symptoms {
                let onset = self
                    .dates
                    .asymptomatic_onset
                    .or(self.dates.infectious_start)
                    .unwrap_or(today);
                (onset.max(today), self.disease.days_symptomatic())
            } else {
                (self.dates.symptoms_start.unwrap_or(today).max(today), 0)
            };
            self.trajectory
                .modify_develops_symptoms(start - self.exposure_date, days);
            self.set_transition_dates();
            debug!(
                "day {}: person {} will{} develop symptoms",
                today,
                self.host,
                if symptoms { "" } else { " not" }
            );
        }
        Ok(())
    }
}
