//! Command line driver: runs a set of seed infections through a disease for a number of days.
//!
//! The configuration file names the disease parameters, the simulation settings and the seeded
//! population. Each person gets one infection at `epidemic_offset`, optionally shifted into the
//! past, and every infection is then advanced once per simulated day.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Command, FromArgMatches as _};
use log::{info, warn, LevelFilter};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::disease::{Disease, DiseaseModel, DiseaseParameters};
use crate::error::InfectionError;
use crate::host::{Host, Location, Person, PersonId, PlaceRef};
use crate::infection::{Infection, Transition};
use crate::report::{InfectionReport, ReportOptions};
use crate::settings::{load_json, ReportVerbosity, SimulationSettings};
use crate::Day;

/// Name of the infection event report inside the output directory.
pub const INFECTION_REPORT_FILE: &str = "infections.csv";

/// Default cli arguments for the infection runner
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Path to the run configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Optional path for report output
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Enable logging at the given level (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,

    /// Replace an infection report left over from an earlier run
    #[arg(long)]
    pub overwrite: bool,
}

/// One seeded person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonSpec {
    pub age: f64,
    #[serde(default)]
    pub chronic_condition: bool,
    /// Days the seed infection is moved into the past before the first update.
    #[serde(default)]
    pub advance: Day,
    #[serde(default)]
    pub place: Option<PlaceRef>,
    #[serde(default)]
    pub household: Option<Location>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    pub disease: DiseaseParameters,
    #[serde(default)]
    pub settings: SimulationSettings,
    pub days: Day,
    pub population: Vec<PersonSpec>,
}

impl RunConfig {
    /// Reads a run configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an `InfectionError` if the file cannot be opened or parsed, or if the number of
    /// days is negative.
    pub fn from_json_file(path: &Path) -> Result<Self, InfectionError> {
        let config: RunConfig = load_json(path)?;
        if config.days < 0 {
            return Err(InfectionError::InvalidParameters(format!(
                "cannot run for {} days",
                config.days
            )));
        }
        Ok(config)
    }
}

/// What happened over a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub days: Day,
    pub infections: usize,
    pub symptomatic: usize,
    pub recovered: usize,
    pub unsusceptible: usize,
    pub deaths: usize,
    pub report_rows: usize,
}

impl RunSummary {
    fn count(&mut self, transition: Transition) {
        match transition {
            Transition::Symptomatic => self.symptomatic += 1,
            Transition::Recovered => self.recovered += 1,
            Transition::Unsusceptible => self.unsusceptible += 1,
            Transition::Infectious | Transition::Asymptomatic => {}
        }
    }
}

fn create_cli() -> Command {
    let cli = Command::new("ixa-infection");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation with the default cli arguments parsed from the process command line.
///
/// # Errors
///
/// Returns an error if argument parsing or the run fails.
pub fn run_with_args() -> Result<RunSummary, Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(&args)?)
}

/// Runs a simulation described by already parsed arguments.
///
/// # Errors
///
/// Returns an `InfectionError` if the configuration is invalid or the report cannot be written.
pub fn run_with_args_internal(args: &BaseArgs) -> Result<RunSummary, InfectionError> {
    if let Some(level) = args.log_level {
        crate::log::set_log_level(level);
    }

    info!("Loading run configuration from: {}", args.config.display());
    let config = RunConfig::from_json_file(&args.config)?;

    let report = if config.settings.report_verbosity() == ReportVerbosity::Off {
        None
    } else {
        let mut options = ReportOptions::default();
        if !args.output_dir.is_empty() {
            options.directory(PathBuf::from(&args.output_dir));
        }
        options.overwrite(args.overwrite);
        Some(InfectionReport::create(
            &options,
            INFECTION_REPORT_FILE,
            &config.settings,
        )?)
    };

    let mut rng = SmallRng::seed_from_u64(args.random_seed);
    run(config, report, &mut rng)
}

struct Simulation {
    disease: Arc<dyn DiseaseModel>,
    settings: SimulationSettings,
    people: Vec<Person>,
    infections: Vec<Infection>,
    /// Last day each infection has already been brought up to, by seeding or a daily step.
    updated_through: Vec<Day>,
    report: Option<InfectionReport>,
    summary: RunSummary,
}

/// Seeds one infection per person in `config` and advances all of them for `config.days` days.
///
/// # Errors
///
/// Returns an `InfectionError` if the disease parameters are invalid, a person cannot be
/// infected, or the report cannot be written.
pub fn run(
    config: RunConfig,
    report: Option<InfectionReport>,
    rng: &mut SmallRng,
) -> Result<RunSummary, InfectionError> {
    let disease: Arc<dyn DiseaseModel> = Arc::new(Disease::new(config.disease)?);
    let mut simulation = Simulation {
        disease,
        settings: config.settings,
        people: Vec::with_capacity(config.population.len()),
        infections: Vec::with_capacity(config.population.len()),
        updated_through: Vec::with_capacity(config.population.len()),
        report,
        summary: RunSummary {
            days: config.days,
            ..Default::default()
        },
    };

    simulation.seed(&config.population, rng)?;
    let start = simulation.settings.epidemic_offset;
    for today in start..start + config.days {
        simulation.step(today, rng)?;
    }

    let summary = simulation.summary;
    info!(
        "{} days of {}: {} infections, {} symptomatic, {} recovered, {} deaths",
        summary.days,
        simulation.disease.name(),
        summary.infections,
        summary.symptomatic,
        summary.recovered,
        summary.deaths
    );
    Ok(summary)
}

impl Simulation {
    fn seed(&mut self, population: &[PersonSpec], rng: &mut SmallRng) -> Result<(), InfectionError> {
        let start = self.settings.epidemic_offset;
        for (index, spec) in population.iter().enumerate() {
            let mut person = Person::new(PersonId(index), spec.age)
                .with_chronic_condition(spec.chronic_condition);
            if let Some(household) = spec.household {
                person = person.with_household(household);
            }

            let mut infection =
                Infection::new(self.disease.clone(), None, &person, spec.place, start, rng)?;
            self.summary.infections += 1;
            self.record(start, "exposure", &infection, &person)?;

            // Advancing fires everything up to and including the offset day.
            let mut updated_through = start - 1;
            if spec.advance > 0 {
                updated_through = start;
                let fired =
                    infection.advance_seed_infection(spec.advance, &mut person, &self.settings)?;
                for transition in fired {
                    self.summary.count(transition);
                    self.record(start, transition.label(), &infection, &person)?;
                    if transition == Transition::Recovered {
                        let recovered_on = infection.infectious_end_date().unwrap_or(start);
                        let record = infection.past_infection_record(&person, recovered_on);
                        person.add_past_infection(self.disease.id(), record);
                    }
                }
            }
            self.people.push(person);
            self.infections.push(infection);
            self.updated_through.push(updated_through);
        }
        if let Some(report) = &mut self.report {
            report.flush()?;
        }
        Ok(())
    }

    fn step(&mut self, today: Day, rng: &mut SmallRng) -> Result<(), InfectionError> {
        let seeds = self
            .people
            .iter_mut()
            .zip(self.infections.iter_mut())
            .zip(self.updated_through.iter_mut());
        for ((person, infection), updated_through) in seeds {
            if !person.is_alive() || today <= *updated_through {
                continue;
            }
            *updated_through = today;
            for transition in infection.update(today, person, &self.settings, rng) {
                self.summary.count(transition);
                if let Some(report) = &mut self.report {
                    report.record(today, transition.label(), infection, person, None)?;
                }
                if transition == Transition::Recovered {
                    let record = infection.past_infection_record(person, today);
                    person.add_past_infection(self.disease.id(), record);
                }
            }
            if infection.is_fatal_today() {
                warn!("day {}: person {} died of {}", today, person.id(), self.disease.name());
                person.die();
                self.summary.deaths += 1;
            }
        }
        if let Some(report) = &mut self.report {
            report.flush()?;
            self.summary.report_rows = report.rows();
        }
        Ok(())
    }

    fn record(
        &mut self,
        day: Day,
        event: &'static str,
        infection: &Infection,
        person: &Person,
    ) -> Result<(), InfectionError> {
        if let Some(report) = &mut self.report {
            report.record(day, event, infection, person, None)?;
            self.summary.report_rows = report.rows();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::{AgeBand, CaseFatalityParameters};
    use crate::trajectory::Trajectory;
    use tempfile::tempdir;

    fn disease_parameters() -> DiseaseParameters {
        DiseaseParameters {
            id: 0,
            name: "influenza".to_string(),
            progression: Default::default(),
            infectivity_threshold: 0.0,
            symptomaticity_threshold: 0.0,
            days_recovered: Some(5),
            days_symptomatic: 3,
            immunity: vec![AgeBand {
                up_to: 200,
                value: 1.0,
            }],
            trajectories: vec![AgeBand {
                up_to: 200,
                value: Trajectory::new(
                    vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0],
                    vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                )
                .unwrap(),
            }],
            case_fatality: None,
        }
    }

    fn person(age: f64) -> PersonSpec {
        PersonSpec {
            age,
            chronic_condition: false,
            advance: 0,
            place: None,
            household: None,
        }
    }

    fn config(population: Vec<PersonSpec>, days: Day) -> RunConfig {
        RunConfig {
            disease: disease_parameters(),
            settings: SimulationSettings {
                epidemic_offset: 10,
                track_infection_events: 1,
                ..Default::default()
            },
            days,
            population,
        }
    }

    #[test]
    fn every_seed_runs_its_course() {
        let mut rng = SmallRng::seed_from_u64(42);
        let summary = run(config(vec![person(30.0), person(60.0)], 20), None, &mut rng).unwrap();
        assert_eq!(summary.infections, 2);
        assert_eq!(summary.symptomatic, 2);
        assert_eq!(summary.recovered, 2);
        assert_eq!(summary.unsusceptible, 2);
        assert_eq!(summary.deaths, 0);
    }

    #[test]
    fn runs_that_stop_early_leave_infections_open() {
        let mut rng = SmallRng::seed_from_u64(42);
        // Exposure on 10, symptoms from 14: a four day run ends before them.
        let summary = run(config(vec![person(30.0)], 4), None, &mut rng).unwrap();
        assert_eq!(summary.symptomatic, 0);
        assert_eq!(summary.recovered, 0);
    }

    #[test]
    fn advanced_seeds_start_part_way_through() {
        let mut seeded = person(30.0);
        seeded.advance = 8;
        let mut rng = SmallRng::seed_from_u64(42);
        let summary = run(config(vec![seeded], 10), None, &mut rng).unwrap();
        // Exposure moves to day 2: infectious, symptomatic and recovered by day 10, immunity
        // lost on 14.
        assert_eq!(summary.recovered, 1);
        assert_eq!(summary.unsusceptible, 1);
    }

    #[test]
    fn seed_transitions_on_the_offset_day_fire_once() {
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::default();
        options.directory(temp_dir.path().to_path_buf());
        let mut run_config = config(Vec::new(), 10);
        run_config.disease.trajectories[0].value =
            Trajectory::new(vec![0.0, 0.0, 1.0, 1.0, 1.0], vec![0.0; 5]).unwrap();
        let mut seeded = person(30.0);
        seeded.advance = 5;
        run_config.population = vec![seeded];
        let report =
            InfectionReport::create(&options, INFECTION_REPORT_FILE, &run_config.settings).unwrap();

        let mut rng = SmallRng::seed_from_u64(42);
        let summary = run(run_config, Some(report), &mut rng).unwrap();
        // Exposure moves to day 5: infective on 7-9, recovered exactly on the offset day 10.
        assert_eq!(summary.recovered, 1);
        assert_eq!(summary.unsusceptible, 1);
        // Exposure, infectious, recovered, unsusceptible.
        assert_eq!(summary.report_rows, 4);

        let mut reader =
            csv::Reader::from_path(temp_dir.path().join(INFECTION_REPORT_FILE)).unwrap();
        let recovered_rows = reader
            .records()
            .map(Result::unwrap)
            .filter(|row| &row[1] == "recovered")
            .count();
        assert_eq!(recovered_rows, 1);
    }

    #[test]
    fn offset_day_transitions_of_fresh_seeds_still_fire() {
        let mut run_config = config(vec![person(30.0)], 1);
        run_config.disease.trajectories[0].value =
            Trajectory::new(vec![1.0, 1.0], vec![1.0, 0.0]).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let summary = run(run_config, None, &mut rng).unwrap();
        assert_eq!(summary.symptomatic, 1);
        assert_eq!(summary.recovered, 0);
    }

    #[test]
    fn dead_hosts_stop_updating() {
        let mut run_config = config(vec![person(80.0)], 20);
        run_config.disease.case_fatality = Some(CaseFatalityParameters {
            min_symptoms: 0.0,
            prob_by_day: vec![1.0],
            age_factors: Vec::new(),
            chronic_condition_multiplier: 1.0,
        });
        let mut rng = SmallRng::seed_from_u64(42);
        let summary = run(run_config, None, &mut rng).unwrap();
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.symptomatic, 1);
        assert_eq!(summary.recovered, 0);
    }

    #[test]
    fn report_gets_one_row_per_event() {
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::default();
        options.directory(temp_dir.path().to_path_buf());
        let run_config = config(vec![person(30.0)], 20);
        let report =
            InfectionReport::create(&options, INFECTION_REPORT_FILE, &run_config.settings).unwrap();

        let mut rng = SmallRng::seed_from_u64(42);
        let summary = run(run_config, Some(report), &mut rng).unwrap();
        // Exposure, infectious, symptomatic, recovered, unsusceptible.
        assert_eq!(summary.report_rows, 5);

        let mut reader =
            csv::Reader::from_path(temp_dir.path().join(INFECTION_REPORT_FILE)).unwrap();
        assert_eq!(reader.records().count(), 5);
    }

    #[test]
    fn test_run_with_config_path() {
        let temp_dir = tempdir().unwrap();
        let test_args = BaseArgs {
            random_seed: 42,
            config: PathBuf::from("tests/data/two_person_run.json"),
            output_dir: temp_dir.path().to_str().unwrap().to_string(),
            log_level: None,
            overwrite: false,
        };
        let summary = run_with_args_internal(&test_args).unwrap();
        assert_eq!(summary.infections, 2);
        assert!(temp_dir.path().join(INFECTION_REPORT_FILE).exists());
    }

    #[test]
    fn test_run_with_missing_config() {
        let test_args = BaseArgs {
            random_seed: 0,
            config: PathBuf::from("tests/data/does_not_exist.json"),
            output_dir: String::new(),
            log_level: None,
            overwrite: false,
        };
        let result = run_with_args_internal(&test_args);
        assert!(matches!(result, Err(InfectionError::IoError(_))));
    }

    #[test]
    fn negative_run_length_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"disease": {"id": 0, "name": "x"}, "days": -1, "population": []}"#,
        )
        .unwrap();
        let result = RunConfig::from_json_file(&path);
        assert!(matches!(result, Err(InfectionError::InvalidParameters(_))));
    }
}
