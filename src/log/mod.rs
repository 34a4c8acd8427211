//! Diagnostic logging for the infection model.
//!
//! Messages trace date derivations, host notifications and rejected interventions. They are not
//! the infection event record, which [`crate::report`] writes for analysis.
//!
//! Logging is off until [`set_log_level`] is called; the runner calls it for `--log-level`.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::sync::{LazyLock, Mutex, PoisonError};

pub use log::LevelFilter;
#[cfg(feature = "logging")]
use log4rs::Handle;

/// Targets held at a fixed level whatever the model's level is. Reloading the console appender
/// is chatty.
const QUIET_TARGETS: [(&str, LevelFilter); 1] = [("log4rs", LevelFilter::Warn)];

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The level the installed logger was last built with.
#[derive(Debug)]
struct LogConfiguration {
    level: LevelFilter,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            level: LevelFilter::Off,

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

/// Emits model messages with priority at least `level`. `LevelFilter::Off` silences them.
pub fn set_log_level(level: LevelFilter) {
    let mut configuration = LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    configuration.level = level;
    configuration.install();
}
