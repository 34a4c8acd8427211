//! The infection event report.
//!
//! One CSV row per infection event: the exposure itself and every transition the host is
//! notified of. Missing identities and unset dates are written as `-1`, places as `X` and
//! coordinates as `-999`, the markers downstream analysis scripts already expect. With detailed
//! tracking enabled the row also carries the distance to the infector, the infector's census
//! tract and the live values of the infection.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::{debug, error};
use serde_derive::Serialize;

use crate::disease::DiseaseId;
use crate::error::InfectionError;
use crate::host::Host;
use crate::infection::{date_or_never, Infection};
use crate::settings::{ReportVerbosity, SimulationSettings};
use crate::Day;

const NO_COORDINATE: f64 = -999.0;
const NO_PLACE: char = 'X';

/// Where report files go and what they are called.
#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub directory: PathBuf,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            file_prefix: String::new(),
            directory: PathBuf::from("."),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    /// Prepended to every report file name.
    pub fn file_prefix(&mut self, file_prefix: String) -> &mut ReportOptions {
        self.file_prefix = file_prefix;
        self
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut ReportOptions {
        self.directory = directory;
        self
    }

    /// Replace report files left over from an earlier run instead of failing.
    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.file_prefix, file_name))
    }
}

// Checks that the path is valid and creates the file and all parent directories.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, InfectionError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if !overwrite && path.exists() {
                return Err(InfectionError::ReportError(format!(
                    "report file {} already exists",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(InfectionError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// What the report needs to know about the person who passed the infection on.
#[derive(Clone, Copy)]
pub struct InfectorDetails<'a> {
    pub host: &'a dyn Host,
    pub exposure_date: Day,
    pub symptomatic: bool,
}

#[derive(Serialize, Debug)]
struct InfectionEventRecord {
    day: Day,
    event: &'static str,
    disease: DiseaseId,
    host: usize,
    age: f64,
    infector: i64,
    infector_age: f64,
    infector_symptomatic: i8,
    place_type: char,
    place_id: i64,
    place_subtype: char,
    place_size: i64,
    latitude: f64,
    longitude: f64,
    home_latitude: f64,
    home_longitude: f64,
    infector_exposure_date: i64,
    exposure_date: Day,
    infectious_date: i64,
    symptoms_date: i64,
    recovery_date: i64,
    unsusceptible_date: i64,
    distance: Option<f64>,
    census_tract: Option<i64>,
    will_be_symptomatic: Option<bool>,
    susceptibility: Option<f64>,
    infectivity: Option<f64>,
    infectivity_multiplier: Option<f64>,
    symptoms: Option<f64>,
}

pub struct InfectionReport {
    writer: Writer<File>,
    path: PathBuf,
    detailed: bool,
    enable_hospitals: bool,
    rows: usize,
}

impl InfectionReport {
    /// Opens `file_name` (which must end in `.csv`) under the configured directory.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::ReportError` if the name is not a CSV or the file exists and
    /// overwriting is off, and `InfectionError::IoError` if the file cannot be created.
    pub fn create(
        options: &ReportOptions,
        file_name: &str,
        settings: &SimulationSettings,
    ) -> Result<Self, InfectionError> {
        let path = options.path_for(file_name);
        let file = generate_validate_filepath(&path, options.overwrite)?;
        debug!("writing infection events to {}", path.display());
        Ok(InfectionReport {
            writer: Writer::from_writer(file),
            path,
            detailed: settings.report_verbosity() >= ReportVerbosity::Detailed,
            enable_hospitals: settings.enable_hospitals,
            rows: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows written so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Writes one row describing `infection` in `host` on `day`.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::CSVError` if the row cannot be written.
    pub fn record(
        &mut self,
        day: Day,
        event: &'static str,
        infection: &Infection,
        host: &dyn Host,
        infector: Option<InfectorDetails<'_>>,
    ) -> Result<(), InfectionError> {
        let place = infection.place();
        let (home_latitude, home_longitude) = host
            .household()
            .map_or((NO_COORDINATE, NO_COORDINATE), |home| {
                (home.latitude, home.longitude)
            });
        let mut row = InfectionEventRecord {
            day,
            event,
            disease: infection.disease_id(),
            host: host.id().0,
            age: host.real_age(),
            infector: infector.map_or(-1, |infector| id_or_minus_one(infector.host.id().0)),
            infector_age: infector.map_or(-1.0, |infector| infector.host.real_age()),
            infector_symptomatic: infector.map_or(-1, |infector| i8::from(infector.symptomatic)),
            place_type: place.map_or(NO_PLACE, |place| place.kind),
            place_id: place.map_or(-1, |place| id_or_minus_one(place.id)),
            place_subtype: place.map_or(NO_PLACE, |place| place.subtype.code()),
            place_size: place.map_or(-1, |place| id_or_minus_one(place.size)),
            latitude: place.map_or(NO_COORDINATE, |place| place.latitude),
            longitude: place.map_or(NO_COORDINATE, |place| place.longitude),
            home_latitude,
            home_longitude,
            infector_exposure_date: infector.map_or(-1, |infector| i64::from(infector.exposure_date)),
            exposure_date: infection.exposure_date(),
            infectious_date: date_or_never(infection.infectious_start_date()),
            symptoms_date: date_or_never(infection.symptoms_start_date()),
            recovery_date: date_or_never(infection.infectious_end_date()),
            unsusceptible_date: date_or_never(infection.immunity_end_date()),
            distance: None,
            census_tract: None,
            will_be_symptomatic: None,
            susceptibility: None,
            infectivity: None,
            infectivity_multiplier: None,
            symptoms: None,
        };

        if self.detailed {
            row.distance = Some(match (place, infector) {
                (Some(place), Some(infector)) if place.kind != NO_PLACE => {
                    let (x, y) = host.position();
                    let (infector_x, infector_y) = infector.host.position();
                    (x - infector_x).hypot(y - infector_y)
                }
                _ => -1.0,
            });
            row.census_tract = Some(infector.map_or(-1, |infector| {
                self.census_tract_of(infector.host).unwrap_or(-1)
            }));
            row.will_be_symptomatic = Some(infection.will_be_symptomatic());
            row.susceptibility = Some(infection.susceptibility());
            row.infectivity = Some(infection.infectivity());
            row.infectivity_multiplier = Some(infection.infectivity_multiplier());
            row.symptoms = Some(infection.symptoms());
        }

        self.writer.serialize(row)?;
        self.rows += 1;
        Ok(())
    }

    fn census_tract_of(&self, infector: &dyn Host) -> Option<i64> {
        let household = infector.household().or_else(|| {
            if self.enable_hospitals && infector.is_hospitalized() {
                infector.permanent_household()
            } else {
                None
            }
        });
        household.and_then(|household| household.census_tract)
    }

    /// Pushes buffered rows to disk. Called once at the end of every simulated day.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::IoError` if the file cannot be written.
    pub fn flush(&mut self) -> Result<(), InfectionError> {
        self.writer.flush().map_err(|err| {
            error!("could not flush {}: {}", self.path.display(), err);
            InfectionError::from(err)
        })
    }
}

fn id_or_minus_one(id: usize) -> i64 {
    i64::try_from(id).unwrap_or(-1)
}
