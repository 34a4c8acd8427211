//! Within-host disease progression for agent-based epidemic models
//!
//! An [`Infection`](infection::Infection) is one disease episode in one host. It follows a
//! day-indexed [`Trajectory`](trajectory::Trajectory) of infectivity and symptom severity drawn
//! from the disease's parameters, derives from it the calendar days on which the host's state
//! changes, and notifies the host of each change on the day it happens.
//!
//! The pieces are:
//! * [`disease`]: the disease parameters an infection reads (thresholds, trajectories,
//!   immunity and case fatality).
//! * [`host`]: the interface an infected agent implements, and a simple [`Person`](host::Person).
//! * [`infection`]: date derivation, daily updates and the interventions that reshape an
//!   episode (longer or shorter symptomatic and asymptomatic periods, forced or suppressed
//!   symptoms).
//! * [`report`]: the CSV infection event report.
//! * [`runner`]: the `ixa-infection` command line driver.
pub mod disease;
pub mod error;
pub mod hashing;
pub mod host;
pub mod infection;
pub mod log;
mod macros;
pub mod numeric;
pub mod report;
pub mod runner;
pub mod settings;
pub mod trajectory;

/// A simulation day. Transition dates that never happen are `None` rather than a sentinel day.
pub type Day = i32;

pub use error::InfectionError;
pub use infection::{Infection, Transition, TransitionDates};
