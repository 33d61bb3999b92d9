//! Solver-neutral problem form shared by the assembler and the solve backends.
//!
//! The assembler never talks to a solver directly. It emits an [`LpProblem`]
//! (bounded variables, named linear constraints grouped by family, a linear
//! objective to minimise) and hands it to any [`SolveBackend`]. Backends
//! report a [`SolutionStatus`] plus one value per variable.
//!
//! ```text
//! cep-algo ──LpProblem──> SolveBackend (good_lp / clarabel, highs, ...)
//!          <─LpSolution──
//! ```
//!
//! Long solves go through [`solve_bounded`], which runs the backend on a tokio
//! blocking worker and gives up after a timeout or when a
//! [`CancellationToken`] fires.

pub mod backend;
pub mod bounded;
pub mod error;
pub mod problem;
pub mod solution;

pub use backend::SolveBackend;
pub use bounded::{solve_bounded, CancellationToken, SolveOptions};
pub use error::SolverError;
pub use problem::{LinearConstraint, LinearExpr, LpProblem, ProblemType, Sense, VarId, VariableDef};
pub use solution::{LpSolution, SolutionStatus};
