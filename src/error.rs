use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `InfectionError` and maps other errors to
/// convert to an `InfectionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum InfectionError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// The caller broke a contract of the infection model, e.g. no trajectory could be
    /// obtained or an undated infection was advanced.
    PreconditionViolation(String),
    /// A modification was rejected. The infection is left exactly as it was.
    InvalidOperation(String),
    InvalidParameters(String),
    ReportError(String),
}

impl From<io::Error> for InfectionError {
    fn from(error: io::Error) -> Self {
        InfectionError::IoError(error)
    }
}

impl From<serde_json::Error> for InfectionError {
    fn from(error: serde_json::Error) -> Self {
        InfectionError::JsonError(error)
    }
}

impl From<csv::Error> for InfectionError {
    fn from(error: csv::Error) -> Self {
        InfectionError::CSVError(error)
    }
}

impl std::error::Error for InfectionError {}

impl Display for InfectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}
