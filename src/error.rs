//! Error types for init-keyboard

use std::io;

use thiserror::Error;

/// Failure of a single external tool invocation
#[derive(Debug, Error)]
pub enum RunError {
    /// The program could not be started at all (missing binary, permissions)
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program ran but did not exit successfully
    #[error("{program} exited with {status}")]
    Status { program: String, status: String },
}

impl RunError {
    /// Program the failed invocation was running
    pub fn program(&self) -> &str {
        match self {
            RunError::Spawn { program, .. } | RunError::Status { program, .. } => program,
        }
    }
}

/// The one error the keyboard initializer reports to its caller.
///
/// Carries every failed invocation for logging; the exit status does not
/// distinguish between them.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("external configuration command failed")]
    ConfigurationFailed(Vec<RunError>),
}

impl InitError {
    pub fn failures(&self) -> &[RunError] {
        match self {
            InitError::ConfigurationFailed(failures) => failures,
        }
    }
}
