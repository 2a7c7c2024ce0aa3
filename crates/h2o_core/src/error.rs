//! # H2O Error Types
//!
//! All errors that can end a simulation run. Every one of them maps to
//! process exit code 1.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::log::UnitId;

/// Errors that can occur while setting up or running a simulation.
#[derive(Error, Debug)]
pub enum H2oError {
    /// The command line did not carry exactly four positional arguments.
    #[error("invalid number of arguments: expected 4 (NO NH TI TB), got {0}")]
    ArgumentCount(usize),

    /// A positional argument was not a number or was out of range.
    #[error("invalid argument {name}={value:?}: {reason}")]
    InvalidArgument {
        /// Argument name (`NO`, `NH`, `TI`, `TB`).
        name: &'static str,
        /// The raw value as given.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A programmatic configuration was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The log file could not be created.
    #[error("could not open log file {}: {source}", path.display())]
    LogOpen {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// Writing to the log sink failed during the run.
    #[error("log write failed: {0}")]
    LogWrite(#[source] io::Error),

    /// A unit could not be spawned.
    #[error("could not spawn {unit}: {source}")]
    Spawn {
        /// The unit that failed to start.
        unit: UnitId,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A unit panicked; the shared state can no longer be trusted.
    #[error("{unit} panicked")]
    UnitPanicked {
        /// The unit that panicked.
        unit: UnitId,
    },
}

impl H2oError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type for H2O operations.
pub type H2oResult<T> = Result<T, H2oError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::UnitKind;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = H2oError::InvalidArgument {
            name: "TI",
            value: "2000".to_string(),
            reason: "must be in 0..=1000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid argument TI=\"2000\": must be in 0..=1000"
        );

        let err = H2oError::UnitPanicked {
            unit: UnitId::new(UnitKind::Hydrogen, 3),
        };
        assert_eq!(err.to_string(), "H 3 panicked");
    }

    #[test]
    fn test_every_error_exits_with_one() {
        assert_eq!(H2oError::ArgumentCount(2).exit_code(), 1);
        assert_eq!(
            H2oError::LogWrite(io::Error::new(io::ErrorKind::Other, "disk full")).exit_code(),
            1
        );
    }
}
