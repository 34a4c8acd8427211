//! Simulation-wide switches that the infection model reads.
//!
//! These used to be process-wide globals. They are now an explicit value handed to the calls
//! that need them, loaded from the same JSON configuration file as the disease parameters.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::InfectionError;
use crate::Day;

/// How much of each infection event is written to the infection report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportVerbosity {
    Off,
    Basic,
    Detailed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Calendar day the epidemic is considered to start on. Seed infections that are advanced
    /// past transitions on or before this day are notified immediately.
    pub epidemic_offset: Day,
    /// Base fatality decisions on the whole host (chronic conditions included) instead of
    /// only on age.
    pub enable_chronic_condition: bool,
    /// 0 disables the infection report, 1 writes basic rows, 2 or more adds detail columns.
    pub track_infection_events: u8,
    /// Fall back to the permanent household of hospitalized infectors in the report.
    pub enable_hospitals: bool,
}

impl SimulationSettings {
    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an `InfectionError` if the file cannot be opened or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, InfectionError> {
        load_json(path)
    }

    #[must_use]
    pub fn report_verbosity(&self) -> ReportVerbosity {
        match self.track_infection_events {
            0 => ReportVerbosity::Off,
            1 => ReportVerbosity::Basic,
            _ => ReportVerbosity::Detailed,
        }
    }
}

/// Deserializes a JSON file into `T`.
///
/// # Errors
///
/// Returns an `InfectionError` if the file cannot be opened or parsed.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, InfectionError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader)?;
    Ok(value)
}
