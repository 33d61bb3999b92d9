use std::collections::{BTreeMap, HashMap};

use cep_core::{
    availability_key, CepError, CepResult, ClusteredTimeSeries, InputData, Label, LineData,
    ModelConfig, StoragePart, TechCategory, Technology, VariableName,
};
use cep_solver_common::{LinearExpr, LpProblem, Sense, VarId};
use tracing::{debug, info};

use super::{CepModel, ModelVariable};
use crate::plan::{ConstraintFamily, DeclarationPlan};
use crate::sets::{IndexSets, EXISTING, NEW};

/// Assembles a [`CepModel`] from immutable inputs.
///
/// Every call to [`ModelBuilder::build`] derives fresh sets and a fresh plan,
/// so one builder can be reused and several builders can run in parallel.
///
/// # Example
///
/// ```no_run
/// use cep_algo::ModelBuilder;
/// use cep_core::{ClusteredTimeSeries, InputData, ModelConfig};
///
/// # fn load() -> (InputData, ClusteredTimeSeries) { unimplemented!() }
/// let (data, ts) = load();
/// let config = ModelConfig::default().with_lost_load_price(10_000.0);
/// let model = ModelBuilder::new(&data, &ts, &config).build()?;
/// println!("{}", model.description());
/// # Ok::<(), cep_core::CepError>(())
/// ```
pub struct ModelBuilder<'a> {
    data: &'a InputData,
    ts: &'a ClusteredTimeSeries,
    config: &'a ModelConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(data: &'a InputData, ts: &'a ClusteredTimeSeries, config: &'a ModelConfig) -> Self {
        Self { data, ts, config }
    }

    pub fn build(&self) -> CepResult<CepModel> {
        let sets = IndexSets::derive(self.data, self.ts, self.config)?;
        let plan = DeclarationPlan::from_config(self.config);
        debug!(
            descriptor = %self.config.descriptor,
            techs = sets.tech.len(),
            nodes = sets.node.len(),
            lines = sets.line.len(),
            periods = sets.k.len(),
            steps = sets.t.len(),
            "derived index sets"
        );

        let mut asm = Assembly::new(self.data, self.ts, self.config, &sets, &self.config.descriptor);
        asm.declare_variables(&plan)?;
        asm.emit_constraints(&plan)?;
        asm.set_objective()?;

        let Assembly { problem, vars, .. } = asm;
        info!(
            descriptor = %self.config.descriptor,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            families = plan.families.len(),
            "assembled capacity expansion model"
        );
        Ok(CepModel {
            problem,
            variables: vars,
            sets,
            plan,
            config: self.config.clone(),
        })
    }
}

/// Working state of one assembly.
pub(super) struct Assembly<'a> {
    pub data: &'a InputData,
    pub ts: &'a ClusteredTimeSeries,
    pub config: &'a ModelConfig,
    pub sets: &'a IndexSets,
    pub techs: HashMap<&'a str, &'a Technology>,
    pub lines: HashMap<&'a str, &'a LineData>,
    pub problem: LpProblem,
    pub vars: BTreeMap<VariableName, ModelVariable>,
}

impl<'a> Assembly<'a> {
    fn new(
        data: &'a InputData,
        ts: &'a ClusteredTimeSeries,
        config: &'a ModelConfig,
        sets: &'a IndexSets,
        name: &str,
    ) -> Self {
        let techs = data
            .technologies()
            .filter(|t| sets.tech.contains(&t.name))
            .map(|t| (t.name.as_str(), t))
            .collect();
        let lines = data
            .lines()
            .values()
            .iter()
            .filter(|l| sets.line.contains(&l.name))
            .map(|l| (l.name.as_str(), l))
            .collect();
        Self {
            data,
            ts,
            config,
            sets,
            techs,
            lines,
            problem: LpProblem::new(name),
            vars: BTreeMap::new(),
        }
    }

    pub fn tech(&self, name: &str) -> CepResult<&'a Technology> {
        self.techs
            .get(name)
            .copied()
            .ok_or_else(|| CepError::key_not_found("tech", name))
    }

    pub fn line(&self, name: &str) -> CepResult<&'a LineData> {
        self.lines
            .get(name)
            .copied()
            .ok_or_else(|| CepError::key_not_found("line", name))
    }

    /// Lines served by a transmission technology, in line order.
    pub fn lines_of(&self, tech: &str) -> Vec<&'a LineData> {
        self.sets
            .line
            .iter()
            .filter_map(|name| self.lines.get(name.as_str()).copied())
            .filter(|l| l.tech == tech)
            .collect()
    }

    /// Storage chargers or dischargers attached to a reservoir.
    pub fn storage_parts(&self, energy: &str, part: StoragePart) -> Vec<&'a Technology> {
        let names = match part {
            StoragePart::Charge => &self.sets.tech_storage_charge,
            StoragePart::Discharge => &self.sets.tech_storage_discharge,
            StoragePart::Energy => &self.sets.tech_storage_energy,
        };
        names
            .iter()
            .filter_map(|n| self.techs.get(n.as_str()).copied())
            .filter(|t| {
                t.category == TechCategory::Storage(part)
                    && (part == StoragePart::Energy || t.storage_unit.as_deref() == Some(energy))
            })
            .collect()
    }

    /// Problem variable of one entry; `None` when the entry does not apply.
    pub fn entry(&self, name: VariableName, key: &[Label]) -> CepResult<Option<VarId>> {
        self.vars
            .get(&name)
            .ok_or_else(|| CepError::MissingData(format!("variable {} is not declared", name)))?
            .entries
            .get(key)
            .copied()
    }

    /// Like [`Assembly::entry`] but the entry must apply.
    pub fn required(&self, name: VariableName, key: &[Label]) -> CepResult<VarId> {
        self.entry(name, key)?.ok_or_else(|| {
            let labels: Vec<String> = key.iter().map(ToString::to_string).collect();
            CepError::MissingData(format!(
                "{}[{}] does not apply to this model",
                name,
                labels.join(",")
            ))
        })
    }

    /// Adds `entry` to `expr` with `coef` when the entry applies.
    pub fn add_entry(
        &self,
        expr: &mut LinearExpr,
        name: VariableName,
        key: &[Label],
        coef: f64,
    ) -> CepResult<()> {
        if let Some(var) = self.entry(name, key)? {
            expr.add_term(var, coef);
        }
        Ok(())
    }

    /// `CAP[tech,ex,node] + CAP[tech,new,node]`
    pub fn cap_total(&self, tech: &str, node: &str) -> CepResult<LinearExpr> {
        let mut expr = LinearExpr::new();
        self.add_entry(&mut expr, VariableName::Cap, &key![tech, EXISTING, node], 1.0)?;
        self.add_entry(&mut expr, VariableName::Cap, &key![tech, NEW, node], 1.0)?;
        Ok(expr)
    }

    /// `TRANS[tech,ex,line] + TRANS[tech,new,line]`
    pub fn trans_total(&self, tech: &str, line: &str) -> CepResult<LinearExpr> {
        let mut expr = LinearExpr::new();
        self.add_entry(&mut expr, VariableName::Trans, &key![tech, EXISTING, line], 1.0)?;
        self.add_entry(&mut expr, VariableName::Trans, &key![tech, NEW, line], 1.0)?;
        Ok(expr)
    }

    /// Availability factor of `tech` at `node`, zero-based `k` and `t`.
    ///
    /// Technologies without a series are fully available. A series missing
    /// for a node where the technology cannot be built counts as zero.
    pub fn availability(&self, tech: &Technology, node: &str, k: usize, t: usize) -> CepResult<f64> {
        match &tech.time_series {
            None => Ok(1.0),
            Some(series) => {
                let key = availability_key(series, node);
                if self.ts.has_series(&key) {
                    self.ts.value(&key, k, t)
                } else {
                    Ok(0.0)
                }
            }
        }
    }

    pub fn weight(&self, k: usize) -> f64 {
        self.sets.period_weight(self.ts, k)
    }

    pub fn add(
        &mut self,
        family: ConstraintFamily,
        name: String,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) {
        self.problem
            .add_constraint(family.as_str(), name, expr.compact(), sense, rhs);
    }
}
