//! Pluggable solve backends.

use std::time::Duration;

use crate::error::SolverError;
use crate::problem::{LpProblem, ProblemType};
use crate::solution::LpSolution;

/// A solver that accepts a solver-neutral [`LpProblem`].
///
/// Implementations must be thread-safe (Send + Sync); [`crate::solve_bounded`]
/// moves them onto a blocking worker.
///
/// # Example
///
/// ```ignore
/// struct MySolver;
///
/// impl SolveBackend for MySolver {
///     fn id(&self) -> &str { "my-solver" }
///     fn supports(&self, problem_type: ProblemType) -> bool { problem_type == ProblemType::Lp }
///     fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
///         // translate, solve, map status
///     }
/// }
/// ```
pub trait SolveBackend: Send + Sync {
    /// Short identifier used in logs and manifests.
    fn id(&self) -> &str;

    /// Whether this backend handles the given problem class.
    fn supports(&self, problem_type: ProblemType) -> bool;

    /// Solve `problem`. Infeasible and unbounded outcomes are `Ok` with the
    /// corresponding status; `Err` is reserved for backend failures.
    fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError>;

    /// Solve with the solver's own wall-clock limit, reporting
    /// [`crate::SolutionStatus::Timeout`] when it is hit. Backends without a
    /// native limit ignore it and rely on [`crate::solve_bounded`] giving up.
    fn solve_within(
        &self,
        problem: &LpProblem,
        _time_limit: Option<Duration>,
    ) -> Result<LpSolution, SolverError> {
        self.solve(problem)
    }
}
