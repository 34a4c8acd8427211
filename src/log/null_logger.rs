//! Stands in for the console logger when the `logging` feature is off.
use crate::log::LogConfiguration;

impl LogConfiguration {
    /// No logger is installed; only the `log` facade's level is set.
    pub(in crate::log) fn install(&mut self) {
        log::set_max_level(self.level);
    }
}
