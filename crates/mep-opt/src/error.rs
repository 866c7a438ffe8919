//! Error type for index building, model construction and solving.

use crate::indices::IndexError;
use crate::solver::SolveStatus;
use mep_core::MepError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptError {
    /// Network assembly, configuration or validation failed
    #[error(transparent)]
    Network(#[from] MepError),

    /// Bad sampling or aggregation settings
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// The validated network cannot be turned into a model
    #[error("Model construction error: {0}")]
    ModelConstruction(String),

    /// Solver finished without an optimal solution
    #[error("Solver finished with status {status}: {message}")]
    SolverStatus { status: SolveStatus, message: String },

    #[error("Unknown solver: {0}")]
    UnknownSolver(String),
}

pub type OptResult<T> = Result<T, OptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_pass_through() {
        let err: OptError = MepError::Config("money_scale must be positive".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: money_scale must be positive"
        );
    }

    #[test]
    fn solver_status_display() {
        let err = OptError::SolverStatus {
            status: SolveStatus::Infeasible,
            message: "no feasible point".into(),
        };
        assert_eq!(
            err.to_string(),
            "Solver finished with status INFEASIBLE: no feasible point"
        );
    }
}
