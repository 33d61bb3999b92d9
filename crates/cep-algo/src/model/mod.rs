//! Model assembly
//!
//! ```text
//! InputData ─┐
//! TimeSeries ├─> IndexSets ─> DeclarationPlan ─> variables ─> constraints ─> CepModel
//! ModelConfig┘
//! ```
//!
//! [`ModelBuilder`] runs the pipeline once per call. The resulting
//! [`CepModel`] owns the solver-neutral [`LpProblem`] together with the
//! variable collections that map every index tuple to a problem variable.

/// Index tuple of labels, e.g. `key![sector, tech, t, k, node]`.
macro_rules! key {
    ($($part:expr),* $(,)?) => {
        [$(cep_core::Label::from($part)),*]
    };
}

mod builder;
mod constraints;
mod variables;

pub use builder::ModelBuilder;

use std::collections::BTreeMap;

use cep_core::{CepError, CepResult, Label, ModelConfig, NamedArray, VariableKind, VariableName};
use cep_solver_common::{LpProblem, VarId};
use serde::{Deserialize, Serialize};

use crate::plan::DeclarationPlan;
use crate::sets::IndexSets;

/// One declared collection. Combinations that do not apply (a technology
/// outside the sector, a line served by another technology) hold `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariable {
    pub kind: VariableKind,
    pub entries: NamedArray<Option<VarId>>,
}

impl ModelVariable {
    pub fn declared_count(&self) -> usize {
        self.entries.values().iter().filter(|v| v.is_some()).count()
    }
}

/// An assembled, unsolved model.
#[derive(Debug, Clone)]
pub struct CepModel {
    pub problem: LpProblem,
    pub variables: BTreeMap<VariableName, ModelVariable>,
    pub sets: IndexSets,
    pub plan: DeclarationPlan,
    pub config: ModelConfig,
}

impl CepModel {
    pub fn variable(&self, name: VariableName) -> CepResult<&ModelVariable> {
        self.variables
            .get(&name)
            .ok_or_else(|| CepError::MissingData(format!("variable {} is not declared", name)))
    }

    /// Problem variable behind one entry, `None` for not-applicable entries.
    pub fn var_id(&self, name: VariableName, key: &[Label]) -> CepResult<Option<VarId>> {
        self.variable(name)?.entries.get(key).copied()
    }

    /// Reproducibility text: toggles, collections and active equations.
    pub fn description(&self) -> String {
        self.plan.describe(&self.config)
    }
}
