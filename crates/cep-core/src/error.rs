//! Error taxonomy shared by every stage of model assembly and solving
//!
//! Assembly-time conditions (`InvalidConfiguration`, `MissingData`, `InvalidData`,
//! `KeyNotFound`, `AxisMismatch`) abort before anything is handed to a solver.
//! `SolveFailed` is only produced after a backend reported a non-optimal status.
//!
//! # Example
//!
//! ```ignore
//! use cep_core::{CepError, CepResult};
//!
//! fn assemble(data: &InputData) -> CepResult<()> {
//!     let sets = IndexSets::derive(data, &ts, &config)?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::Label;

/// Why a solve did not produce an optimal point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveFailure {
    Infeasible,
    Unbounded,
    /// The caller's timeout elapsed before the backend returned.
    Timeout,
    /// The caller's cancellation token was triggered.
    Cancelled,
    /// Any other backend failure, carrying the backend's own message.
    SolverError(String),
}

impl std::fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveFailure::Infeasible => write!(f, "infeasible"),
            SolveFailure::Unbounded => write!(f, "unbounded"),
            SolveFailure::Timeout => write!(f, "timeout"),
            SolveFailure::Cancelled => write!(f, "cancelled"),
            SolveFailure::SolverError(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

/// Unified error type for capacity expansion runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CepError {
    /// Contradictory toggles, e.g. transmission enabled with no lines
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A required technology/node/line/cost/series entry is absent
    #[error("Missing data: {0}")]
    MissingData(String),

    /// A record violates its own invariants (existing > limit, start == end, ...)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Array lookup outside the declared labels of an axis
    #[error("Key '{label}' not found on axis '{axis}'")]
    KeyNotFound { axis: String, label: Label },

    /// Key arity or axis layout does not match the array
    #[error("Axis mismatch: {0}")]
    AxisMismatch(String),

    /// Backend returned a non-optimal status
    #[error("Solve failed ({status}){}", fmt_diagnostic(.diagnostic))]
    SolveFailed {
        status: SolveFailure,
        diagnostic: Option<String>,
    },
}

impl CepError {
    pub fn key_not_found(axis: impl Into<String>, label: impl Into<Label>) -> Self {
        CepError::KeyNotFound {
            axis: axis.into(),
            label: label.into(),
        }
    }

    /// True for `SolveFailed` with an infeasible status.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            CepError::SolveFailed {
                status: SolveFailure::Infeasible,
                ..
            }
        )
    }
}

fn fmt_diagnostic(diagnostic: &Option<String>) -> String {
    diagnostic
        .as_ref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

/// Convenience type alias for Results using CepError.
pub type CepResult<T> = Result<T, CepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_failed_message_includes_diagnostic() {
        let err = CepError::SolveFailed {
            status: SolveFailure::Infeasible,
            diagnostic: Some("emission budget plus fixed design infeasible".into()),
        };
        assert_eq!(
            err.to_string(),
            "Solve failed (infeasible): emission budget plus fixed design infeasible"
        );
        assert!(err.is_infeasible());

        let bare = CepError::SolveFailed {
            status: SolveFailure::Unbounded,
            diagnostic: None,
        };
        assert_eq!(bare.to_string(), "Solve failed (unbounded)");
        assert!(!bare.is_infeasible());
    }

    #[test]
    fn key_not_found_names_axis_and_label() {
        let err = CepError::key_not_found("node", "atlantis");
        assert_eq!(err.to_string(), "Key 'atlantis' not found on axis 'node'");
    }
}
