use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a solve request produced no joint angles.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("solver is not initialized or the robot has no kinematic chains")]
    Configuration,

    #[error("request carries no pose goals")]
    EmptyGoals,

    #[error("number of pose goals ({poses}) not equal to the number of kinematic chains ({chains})")]
    ArityMismatch { poses: usize, chains: usize },

    #[error("solver returned {actual} joint angles, robot has {expected} DOF")]
    DofMismatch { expected: usize, actual: usize },

    #[error("solver failed: {0}")]
    Solver(eyre::Report),
}

/// Wire form of [`SolveError`], carried in `SolveResponse::error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolveErrorKind {
    /// Payload was missing or did not decode as a `SolveRequest`.
    InvalidRequest { message: String },
    Configuration,
    EmptyGoals,
    ArityMismatch { poses: usize, chains: usize },
    DofMismatch { expected: usize, actual: usize },
    SolverFailure { message: String },
}

impl From<&SolveError> for SolveErrorKind {
    fn from(err: &SolveError) -> Self {
        match err {
            SolveError::Configuration => SolveErrorKind::Configuration,
            SolveError::EmptyGoals => SolveErrorKind::EmptyGoals,
            SolveError::ArityMismatch { poses, chains } => SolveErrorKind::ArityMismatch {
                poses: *poses,
                chains: *chains,
            },
            SolveError::DofMismatch { expected, actual } => SolveErrorKind::DofMismatch {
                expected: *expected,
                actual: *actual,
            },
            SolveError::Solver(report) => SolveErrorKind::SolverFailure {
                message: report.to_string(),
            },
        }
    }
}
