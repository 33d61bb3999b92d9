//! Solution representation returned by solve backends.

use serde::{Deserialize, Serialize};

use crate::problem::VarId;

/// Status of the solver solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// The caller's time limit elapsed.
    Timeout,
    /// The caller abandoned the solve.
    Cancelled,
    /// Generic error occurred.
    Error,
}

impl SolutionStatus {
    /// Check if this status represents a successful solve.
    pub fn is_success(&self) -> bool {
        matches!(self, SolutionStatus::Optimal)
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "optimal"),
            SolutionStatus::Infeasible => write!(f, "infeasible"),
            SolutionStatus::Unbounded => write!(f, "unbounded"),
            SolutionStatus::Timeout => write!(f, "timeout"),
            SolutionStatus::Cancelled => write!(f, "cancelled"),
            SolutionStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpSolution {
    pub status: SolutionStatus,
    /// Objective value; NaN unless optimal.
    pub objective: f64,
    /// One value per problem variable, in declaration order; empty unless optimal.
    pub values: Vec<f64>,
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
    /// Backend message (if status is not optimal).
    pub message: Option<String>,
}

impl LpSolution {
    pub fn optimal(objective: f64, values: Vec<f64>, solve_time_ms: i64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective,
            values,
            solve_time_ms,
            message: None,
        }
    }

    /// A solution without values.
    pub fn terminated(status: SolutionStatus, message: impl Into<String>, solve_time_ms: i64) -> Self {
        Self {
            status,
            objective: f64::NAN,
            values: Vec::new(),
            solve_time_ms,
            message: Some(message.into()),
        }
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }
}
