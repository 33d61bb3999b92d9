//! Variable declaration
//!
//! Each collection is declared over the axes of its index sets. Entries that
//! do not apply get `None`; every other entry becomes one bounded continuous
//! variable of the problem.

use std::collections::BTreeMap;

use cep_core::{CepResult, Label, NamedArray, StoragePart, VariableName};
use cep_solver_common::{LpProblem, VariableDef};
use tracing::debug;

use super::builder::Assembly;
use super::ModelVariable;
use crate::plan::DeclarationPlan;

type Bounds = (Option<f64>, Option<f64>);

const NON_NEGATIVE: Bounds = (Some(0.0), None);
const FREE: Bounds = (None, None);

fn text(label: &Label) -> &str {
    label.as_str().unwrap_or_default()
}

fn entry_name(name: VariableName, key: &[&Label]) -> String {
    let labels: Vec<String> = key.iter().map(|l| l.to_string()).collect();
    format!("{}[{}]", name, labels.join(","))
}

fn declare(
    problem: &mut LpProblem,
    vars: &mut BTreeMap<VariableName, ModelVariable>,
    name: VariableName,
    axes: Vec<cep_core::Axis>,
    mut bounds: impl FnMut(&[&Label]) -> Option<Bounds>,
) -> CepResult<()> {
    let entries = NamedArray::from_fn(axes, |key| {
        bounds(key).map(|(lower, upper)| {
            problem.add_variable(VariableDef::continuous(entry_name(name, key), lower, upper))
        })
    })?;
    let variable = ModelVariable {
        kind: name.kind(),
        entries,
    };
    debug!(
        variable = %name,
        shape = ?variable.entries.shape(),
        declared = variable.declared_count(),
        "declared variable collection"
    );
    vars.insert(name, variable);
    Ok(())
}

impl Assembly<'_> {
    pub(super) fn declare_variables(&mut self, plan: &DeclarationPlan) -> CepResult<()> {
        for &name in &plan.variables {
            self.declare_collection(name)?;
        }
        Ok(())
    }

    fn declare_collection(&mut self, name: VariableName) -> CepResult<()> {
        let sets = self.sets;
        let techs = &self.techs;
        let lines = &self.lines;
        let in_sector =
            |sector: &Label, tech: &Label| techs.get(text(tech)).map_or(false, |t| t.sector == text(sector));

        match name {
            VariableName::Cost => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["account", "impact", "tech"])?,
                |_| Some(FREE),
            ),
            VariableName::Cap => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["tech_node", "infrastruct", "node"])?,
                |_| Some(NON_NEGATIVE),
            ),
            VariableName::Gen => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["sector", "tech_dispatch", "t", "k", "node"])?,
                |key| {
                    if !in_sector(key[0], key[1]) {
                        return None;
                    }
                    // Charging is non-positive generation
                    let charge = techs
                        .get(text(key[1]))
                        .and_then(|t| t.category.storage_part())
                        == Some(StoragePart::Charge);
                    Some(if charge { (None, Some(0.0)) } else { NON_NEGATIVE })
                },
            ),
            VariableName::IntraStor => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["sector", "tech_storage_energy", "t_e", "k", "node"])?,
                |key| in_sector(key[0], key[1]).then_some(NON_NEGATIVE),
            ),
            VariableName::InterStor => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["sector", "tech_storage_energy", "i_e", "node"])?,
                |key| in_sector(key[0], key[1]).then_some(NON_NEGATIVE),
            ),
            VariableName::Flow => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["sector", "dir", "tech_transmission", "t", "k", "line"])?,
                |key| {
                    let served = lines.get(text(key[5])).map_or(false, |l| l.tech == text(key[2]));
                    (served && in_sector(key[0], key[2])).then_some(NON_NEGATIVE)
                },
            ),
            VariableName::Trans => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["tech_transmission", "infrastruct", "line"])?,
                |key| {
                    let served = lines.get(text(key[2])).map_or(false, |l| l.tech == text(key[0]));
                    served.then_some(NON_NEGATIVE)
                },
            ),
            VariableName::Slack => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["sector", "t", "k", "node"])?,
                |_| Some(NON_NEGATIVE),
            ),
            VariableName::LostLoad => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["sector"])?,
                |_| Some(NON_NEGATIVE),
            ),
            VariableName::LostEmission => declare(
                &mut self.problem,
                &mut self.vars,
                name,
                sets.axes(&["impact_emission"])?,
                |_| Some(NON_NEGATIVE),
            ),
            VariableName::Theta => {
                let reference = sets.node.first().cloned().unwrap_or_default();
                let networked: Vec<&str> = sets
                    .tech_transmission
                    .iter()
                    .filter_map(|t| techs.get(t.as_str()))
                    .map(|t| t.sector.as_str())
                    .collect();
                declare(
                    &mut self.problem,
                    &mut self.vars,
                    name,
                    sets.axes(&["sector", "t", "k", "node"])?,
                    |key| {
                        if !networked.contains(&text(key[0])) {
                            None
                        } else if text(key[3]) == reference {
                            // Reference angle
                            Some((Some(0.0), Some(0.0)))
                        } else {
                            Some(FREE)
                        }
                    },
                )
            }
        }
    }
}
