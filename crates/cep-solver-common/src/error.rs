//! Error types for solver operations.

use thiserror::Error;

use crate::problem::ProblemType;

/// Errors that can occur during solver operations.
///
/// Infeasible or unbounded problems are not errors; backends report them
/// through [`crate::SolutionStatus`].
#[derive(Debug, Error)]
pub enum SolverError {
    /// Backend cannot handle this class of problem.
    #[error("Solver {backend} does not support {problem_type} problems")]
    Unsupported {
        backend: String,
        problem_type: ProblemType,
    },

    /// Backend failed for a reason other than infeasibility/unboundedness.
    #[error("Solver {backend} failed: {message}")]
    Backend { backend: String, message: String },

    /// Could not start the runtime that drives the solve worker.
    #[error("Failed to start solve runtime: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// Solve worker exited without reporting a result.
    #[error("Solve worker for {0} panicked")]
    WorkerPanicked(String),
}
