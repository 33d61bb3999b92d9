//! Result packaging
//!
//! [`OptResult`] holds solved values per variable collection, the
//! configuration and index sets of the run, and the textual model
//! description. It is self-contained: the sets can be re-derived from the
//! stored configuration and the original inputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cep_core::{
    CepError, CepResult, FixedDesign, ModelConfig, NamedArray, VariableKind, VariableName,
};
use cep_solver_common::{LpSolution, SolutionStatus};
use serde::{Deserialize, Serialize};

use crate::model::CepModel;
use crate::plan::DeclarationPlan;
use crate::sets::IndexSets;

/// Solved values of one collection. Entries without a variable are `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptVariable {
    pub kind: VariableKind,
    pub values: NamedArray<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptResult {
    pub descriptor: String,
    pub status: SolutionStatus,
    pub objective: f64,
    pub variables: BTreeMap<VariableName, OptVariable>,
    pub config: ModelConfig,
    pub sets: IndexSets,
    pub plan: DeclarationPlan,
    /// Toggles, collections and active equations of the model.
    pub model_info: String,
    pub solve_time_ms: i64,
}

impl OptResult {
    /// Read solved values back into the model's variable collections.
    pub fn package(model: &CepModel, solution: &LpSolution) -> CepResult<Self> {
        if solution.values.len() != model.problem.num_variables() {
            return Err(CepError::AxisMismatch(format!(
                "solution has {} values for {} variables",
                solution.values.len(),
                model.problem.num_variables()
            )));
        }
        let variables = model
            .variables
            .iter()
            .map(|(name, variable)| {
                let values = variable
                    .entries
                    .map(|entry| entry.and_then(|var| solution.value(var)).unwrap_or(0.0));
                (
                    *name,
                    OptVariable {
                        kind: variable.kind,
                        values,
                    },
                )
            })
            .collect();
        Ok(Self {
            descriptor: model.config.descriptor.clone(),
            status: solution.status,
            objective: solution.objective,
            variables,
            config: model.config.clone(),
            sets: model.sets.clone(),
            plan: model.plan.clone(),
            model_info: model.description(),
            solve_time_ms: solution.solve_time_ms,
        })
    }

    pub fn variable(&self, name: VariableName) -> CepResult<&OptVariable> {
        self.variables
            .get(&name)
            .ok_or_else(|| CepError::MissingData(format!("result has no variable {}", name)))
    }

    pub fn variables_of_kind(&self, kind: VariableKind) -> BTreeMap<VariableName, &OptVariable> {
        self.variables
            .iter()
            .filter(|(_, v)| v.kind == kind)
            .map(|(name, v)| (*name, v))
            .collect()
    }

    pub fn slack_variables(&self) -> BTreeMap<VariableName, &OptVariable> {
        self.variables_of_kind(VariableKind::Slack)
    }

    /// Design values for a dispatch run, each technology scaled by its
    /// entry in `capacity_factors` (missing entries keep factor 1).
    pub fn design_variables(
        &self,
        capacity_factors: &BTreeMap<String, f64>,
    ) -> CepResult<FixedDesign> {
        let mut design = FixedDesign::new();
        for (name, variable) in self.variables_of_kind(VariableKind::Design) {
            design.insert(name, variable.values.clone())?;
        }
        design.scaled(capacity_factors)
    }

    /// Sum of a cost collection over one impact category, all accounts and
    /// technologies.
    pub fn total_cost(&self, impact: &str) -> CepResult<f64> {
        let costs = self.variable(VariableName::Cost)?;
        Ok(costs
            .values
            .slice(&[("impact", impact.into())])?
            .sum())
    }

    pub fn to_json_file(&self, path: &Path) -> CepResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CepError::InvalidData(format!("serializing result: {}", e)))?;
        fs::write(path, json).map_err(|e| {
            CepError::InvalidData(format!("writing result '{}': {}", path.display(), e))
        })
    }

    pub fn from_json_file(path: &Path) -> CepResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            CepError::MissingData(format!("reading result '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| CepError::InvalidData(format!("parsing result '{}': {}", path.display(), e)))
    }
}
