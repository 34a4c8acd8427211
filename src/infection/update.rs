use log::debug;
use rand::RngCore;

use crate::disease::{FatalityBasis, Progression};
use crate::host::Host;
use crate::infection::{Infection, Transition};
use crate::settings::SimulationSettings;
use crate::Day;

/// Days after exposure before a chronic infection turns infectious.
pub const CHRONIC_LATENT_DAYS: Day = 3;

impl Infection {
    /// Advances the infection to `today`: refreshes the live infectivity and symptom values,
    /// notifies `host` of every transition dated `today`, and decides whether the infection is
    /// fatal today. Returns the transitions that fired, in notification order.
    pub fn update(
        &mut self,
        today: Day,
        host: &mut dyn Host,
        settings: &SimulationSettings,
        rng: &mut dyn RngCore,
    ) -> Vec<Transition> {
        debug_assert_eq!(host.id(), self.host, "updated with the wrong host");
        if self.progression == Progression::Chronic {
            return self.chronic_update(today, host);
        }

        self.fatal_today = false;
        let point = self.trajectory.point(today - self.exposure_date);
        self.infectivity = point.infectivity;
        self.symptoms = point.symptomaticity;

        let mut fired = Vec::new();
        for (date, transition) in self.scheduled_transitions() {
            if date == Some(today) {
                self.fire(transition, host);
                fired.push(transition);
            }
        }
        if !fired.is_empty() {
            debug!("day {}: person {} {:?}", today, self.host, fired);
        }

        if self.disease.is_case_fatality_enabled() && self.is_symptomatic() {
            let days_symptomatic = today - self.dates.symptoms_start.unwrap_or(today);
            let basis = if settings.enable_chronic_condition {
                FatalityBasis::Host(&*host)
            } else {
                FatalityBasis::Age(host.real_age())
            };
            if self
                .disease
                .is_fatal(basis, self.symptoms, days_symptomatic, rng)
            {
                debug!(
                    "day {}: {} is fatal for person {}",
                    today,
                    self.disease.name(),
                    self.host
                );
                self.fatal_today = true;
            }
        }
        fired
    }

    /// The transitions in the order the host hears about them. Symptoms ending on the day of
    /// recovery are covered by the recovery itself.
    fn scheduled_transitions(&self) -> [(Option<Day>, Transition); 5] {
        let symptoms_end = self
            .dates
            .symptoms_end
            .filter(|end| Some(*end) != self.dates.infectious_end);
        [
            (self.dates.infectious_start, Transition::Infectious),
            (self.dates.symptoms_start, Transition::Symptomatic),
            (symptoms_end, Transition::Asymptomatic),
            (self.dates.infectious_end, Transition::Recovered),
            (self.dates.immunity_end, Transition::Unsusceptible),
        ]
    }

    // TODO: the chronic path ignores the trajectory and thresholds entirely; decide whether
    // chronic diseases should get a trajectory of their own.
    fn chronic_update(&mut self, today: Day, host: &mut dyn Host) -> Vec<Transition> {
        let disease = self.disease.id();
        if today - self.exposure_date > CHRONIC_LATENT_DAYS && !host.is_infectious(disease) {
            self.fire(Transition::Infectious, host);
            debug!("day {}: person {} chronically infectious", today, self.host);
            return vec![Transition::Infectious];
        }
        Vec::new()
    }
}
