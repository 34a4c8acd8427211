use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::{LogConfiguration, QUIET_TARGETS};

// ISO 8601 timestamp, colored level, target
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl LogConfiguration {
    /// Installs a stderr logger at this level, or rebuilds the one already installed.
    pub(in crate::log) fn install(&mut self) {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        let loggers = QUIET_TARGETS
            .iter()
            .map(|(target, level)| Logger::builder().build(*target, *level));
        let config = Config::builder()
            .appender(Appender::builder().build("stderr", Box::new(stderr)))
            .loggers(loggers)
            .build(Root::builder().appender("stderr").build(self.level));
        let config = match config {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to build logger config: {e}");
                return;
            }
        };

        match self.root_handle {
            Some(ref mut handle) => handle.set_config(config),
            None => match log4rs::init_config(config) {
                Ok(handle) => self.root_handle = Some(handle),
                Err(e) => eprintln!("failed to install logger: {e}"),
            },
        }
    }
}
