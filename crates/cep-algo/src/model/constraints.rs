//! Constraint families and the objective
//!
//! One method per [`ConstraintFamily`]. Every row is named
//! `family[label,...]` so infeasibility reports and exported problems can be
//! traced back to the index tuple that produced them.

use cep_core::{
    demand_key, Account, CepError, CepResult, Label, StoragePart, TechCategory, VariableName,
};
use cep_solver_common::{LinearExpr, Sense, VarId};
use tracing::debug;

use super::builder::Assembly;
use crate::plan::{ConstraintFamily, DeclarationPlan};
use crate::sets::{EXISTING, NEW, OPPOSITE, UNIFORM};

use VariableName::{
    Cap, Cost, Flow, Gen, InterStor, IntraStor, LostEmission, LostLoad, Slack, Theta, Trans,
};

fn row(family: ConstraintFamily, key: &[Label]) -> String {
    let labels: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("{}[{}]", family, labels.join(","))
}

impl Assembly<'_> {
    pub(super) fn emit_constraints(&mut self, plan: &DeclarationPlan) -> CepResult<()> {
        let sets = self.sets;
        for &family in &plan.families {
            let before = self.problem.num_constraints();
            match family {
                ConstraintFamily::CostCapital => self.cost_investment(family, Account::Capital)?,
                ConstraintFamily::CostFixed => self.cost_investment(family, Account::Fixed)?,
                ConstraintFamily::CostVariable => self.cost_variable()?,
                ConstraintFamily::ExistingInfrastructure => self.existing_infrastructure()?,
                ConstraintFamily::CapacityLimit => self.capacity_limit()?,
                ConstraintFamily::FixedDesign => self.fixed_design()?,
                ConstraintFamily::GenerationBound => self.generation_bound()?,
                ConstraintFamily::StorageChargeBound => {
                    self.storage_power_bound(family, StoragePart::Charge)?
                }
                ConstraintFamily::StorageDischargeBound => {
                    self.storage_power_bound(family, StoragePart::Discharge)?
                }
                ConstraintFamily::StorageLevelBound => self.storage_level_bound()?,
                ConstraintFamily::StorageBalance => self.storage_balance()?,
                ConstraintFamily::StorageIntraCycle => self.storage_intra_cycle()?,
                ConstraintFamily::StorageInterBalance => self.storage_inter_balance()?,
                ConstraintFamily::StorageInterCycle => self.storage_inter_cycle()?,
                ConstraintFamily::TransmissionFlowLimit => self.transmission_flow_limit()?,
                ConstraintFamily::DcPowerFlow => self.dc_power_flow()?,
                ConstraintFamily::EnergyBalance => self.energy_balance()?,
                ConstraintFamily::LostLoadAccounting => self.lost_load_accounting()?,
                ConstraintFamily::LostLoadDisabled => {
                    self.pin_to_zero(family, LostLoad, &sets.sector)?
                }
                ConstraintFamily::LostEmissionDisabled => {
                    self.pin_to_zero(family, LostEmission, &sets.impact_emission)?
                }
                ConstraintFamily::EmissionBudget => self.emission_budget()?,
            }
            debug!(
                family = %family,
                rows = self.problem.num_constraints() - before,
                "emitted constraint family"
            );
        }
        Ok(())
    }

    /// Capital or fixed cost rows: `COST - Σ c · factor · new capacity = 0`.
    fn cost_investment(&mut self, family: ConstraintFamily, account: Account) -> CepResult<()> {
        let sets = self.sets;
        for impact in &sets.impact {
            let monetary = *impact == sets.impact_monetary;
            for tech_name in &sets.tech {
                let tech = self.tech(tech_name)?;
                let factor = match account {
                    Account::Capital if monetary => tech.annuity_factor(),
                    // Embodied emissions are spread over the physical lifetime
                    Account::Capital => 1.0 / tech.lifetime,
                    _ => 1.0,
                };
                let key = key![account, impact, tech_name];
                let mut expr = LinearExpr::term(self.required(Cost, &key)?, 1.0);
                if tech.category.is_transmission() {
                    for line in self.lines_of(tech_name) {
                        let c = self
                            .data
                            .cost(tech_name, &line.node_start, sets.year, account, impact)?;
                        let coef = -c * factor * line.length;
                        self.add_entry(&mut expr, Trans, &key![tech_name, NEW, &line.name], coef)?;
                    }
                } else {
                    for node in &sets.node {
                        let c = self.data.cost(tech_name, node, sets.year, account, impact)?;
                        self.add_entry(&mut expr, Cap, &key![tech_name, NEW, node], -c * factor)?;
                    }
                }
                self.add(family, row(family, &key), expr, Sense::Eq, 0.0);
            }
        }
        Ok(())
    }

    /// Variable cost rows, weighted by period weight and step length.
    /// Charging enters with its magnitude; reservoirs carry no variable cost.
    fn cost_variable(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::CostVariable;
        let sets = self.sets;
        let dt = self.ts.delta_t;
        for impact in &sets.impact {
            for tech_name in &sets.tech {
                let tech = self.tech(tech_name)?;
                let key = key![Account::Variable, impact, tech_name];
                let mut expr = LinearExpr::term(self.required(Cost, &key)?, 1.0);
                match tech.category {
                    TechCategory::Storage(StoragePart::Energy) => {}
                    TechCategory::Transmission => {
                        for line in self.lines_of(tech_name) {
                            let c = self.data.cost(
                                tech_name,
                                &line.node_start,
                                sets.year,
                                Account::Variable,
                                impact,
                            )?;
                            if c == 0.0 {
                                continue;
                            }
                            for (ki, &k) in sets.k.iter().enumerate() {
                                let coef = -self.weight(ki) * dt * c;
                                for &t in &sets.t {
                                    for dir in &sets.dir {
                                        let flow = key![&tech.sector, dir, tech_name, t, k, &line.name];
                                        self.add_entry(&mut expr, Flow, &flow, coef)?;
                                    }
                                }
                            }
                        }
                    }
                    category => {
                        let sign = if category == TechCategory::Storage(StoragePart::Charge) {
                            -1.0
                        } else {
                            1.0
                        };
                        for node in &sets.node {
                            let c = self.data.cost(
                                tech_name,
                                node,
                                sets.year,
                                Account::Variable,
                                impact,
                            )?;
                            if c == 0.0 {
                                continue;
                            }
                            for (ki, &k) in sets.k.iter().enumerate() {
                                let coef = -self.weight(ki) * dt * c * sign;
                                for &t in &sets.t {
                                    let gen = key![&tech.sector, tech_name, t, k, node];
                                    self.add_entry(&mut expr, Gen, &gen, coef)?;
                                }
                            }
                        }
                    }
                }
                self.add(family, row(family, &key), expr, Sense::Eq, 0.0);
            }
        }
        Ok(())
    }

    fn existing_infrastructure(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::ExistingInfrastructure;
        let sets = self.sets;
        let include = self.config.include_existing_infrastructure;
        for tech in &sets.tech_node {
            for node in &sets.node {
                let power_ex = self.data.node(tech, node)?.power_ex;
                let key = key![tech, EXISTING, node];
                let cap = self.required(Cap, &key)?;
                let rhs = if include { power_ex } else { 0.0 };
                self.add(family, row(family, &key), cap.into(), Sense::Eq, rhs);
            }
        }
        for tech in &sets.tech_transmission {
            for line in self.lines_of(tech) {
                let key = key![tech, EXISTING, &line.name];
                let trans = self.required(Trans, &key)?;
                let rhs = if include { line.power_ex } else { 0.0 };
                self.add(family, row(family, &key), trans.into(), Sense::Eq, rhs);
            }
        }
        Ok(())
    }

    fn capacity_limit(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::CapacityLimit;
        let sets = self.sets;
        for tech in &sets.tech_node {
            for node in &sets.node {
                if let Some(lim) = self.data.node(tech, node)?.power_lim {
                    let expr = self.cap_total(tech, node)?;
                    self.add(family, row(family, &key![tech, node]), expr, Sense::Le, lim);
                }
            }
        }
        for tech in &sets.tech_transmission {
            for line in self.lines_of(tech) {
                if let Some(lim) = line.power_lim {
                    let expr = self.trans_total(tech, &line.name)?;
                    self.add(family, row(family, &key![tech, &line.name]), expr, Sense::Le, lim);
                }
            }
        }
        Ok(())
    }

    /// Pin every declared CAP and TRANS entry to the supplied design.
    fn fixed_design(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::FixedDesign;
        let config = self.config;
        let design = config.fixed_design_variables.as_ref().ok_or_else(|| {
            CepError::InvalidConfiguration("fixed design family without design values".into())
        })?;
        for name in [Cap, Trans] {
            let Some(variable) = self.vars.get(&name) else {
                continue;
            };
            let values = design.get(name).ok_or_else(|| {
                CepError::MissingData(format!("fixed design has no values for {}", name))
            })?;
            let mut pinned: Vec<(Vec<Label>, VarId, f64)> = Vec::new();
            for (key, entry) in variable.entries.indexed_iter() {
                let Some(var) = entry else { continue };
                let key: Vec<Label> = key.into_iter().cloned().collect();
                let value = *values.get(&key)?;
                pinned.push((key, *var, value));
            }
            for (key, var, value) in pinned {
                let name = format!("{}:{}", row(family, &key), name);
                self.add(family, name, var.into(), Sense::Eq, value);
            }
        }
        Ok(())
    }

    /// `GEN - availability · capacity ≤ 0` for generation technologies.
    fn generation_bound(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::GenerationBound;
        let sets = self.sets;
        for tech_name in &sets.tech_generation {
            let tech = self.tech(tech_name)?;
            for node in &sets.node {
                let cap = self.cap_total(tech_name, node)?;
                for (ki, &k) in sets.k.iter().enumerate() {
                    for (ti, &t) in sets.t.iter().enumerate() {
                        let key = key![&tech.sector, tech_name, t, k, node];
                        let Some(gen) = self.entry(Gen, &key)? else {
                            continue;
                        };
                        let avail = self.availability(tech, node, ki, ti)?;
                        let expr = LinearExpr::from(gen) - cap.clone() * avail;
                        self.add(family, row(family, &key), expr, Sense::Le, 0.0);
                    }
                }
            }
        }
        Ok(())
    }

    /// Charging is bounded below by `-capacity`, discharging above by `capacity`.
    fn storage_power_bound(&mut self, family: ConstraintFamily, part: StoragePart) -> CepResult<()> {
        let sets = self.sets;
        let names = match part {
            StoragePart::Charge => &sets.tech_storage_charge,
            _ => &sets.tech_storage_discharge,
        };
        for tech_name in names {
            let tech = self.tech(tech_name)?;
            for node in &sets.node {
                let cap = self.cap_total(tech_name, node)?;
                for &k in &sets.k {
                    for &t in &sets.t {
                        let key = key![&tech.sector, tech_name, t, k, node];
                        let Some(gen) = self.entry(Gen, &key)? else {
                            continue;
                        };
                        let (expr, sense) = match part {
                            StoragePart::Charge => (LinearExpr::from(gen) + cap.clone(), Sense::Ge),
                            _ => (LinearExpr::from(gen) - cap.clone(), Sense::Le),
                        };
                        self.add(family, row(family, &key), expr, sense, 0.0);
                    }
                }
            }
        }
        Ok(())
    }

    /// Storage levels within the reservoir capacity.
    ///
    /// With interperiod storage the physical level inside chronological
    /// period `i` is `INTERSTOR[i-1] + INTRASTOR[t,k(i)] - INTRASTOR[0,k(i)]`,
    /// and that sum is kept within `[0, capacity]` at every level point.
    fn storage_level_bound(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::StorageLevelBound;
        let sets = self.sets;
        let interperiod = self.vars.contains_key(&InterStor);
        let first = sets.t_e.first().copied().unwrap_or_default();
        for energy in &sets.tech_storage_energy {
            let tech = self.tech(energy)?;
            for node in &sets.node {
                let cap = self.cap_total(energy, node)?;
                for &k in &sets.k {
                    for &t in &sets.t_e {
                        let key = key![&tech.sector, energy, t, k, node];
                        let level = self.required(IntraStor, &key)?;
                        let expr = LinearExpr::from(level) - cap.clone();
                        self.add(family, row(family, &key), expr, Sense::Le, 0.0);
                    }
                }
                if !interperiod {
                    continue;
                }
                for &i in &sets.i_e {
                    let key = key![&tech.sector, energy, i, node];
                    let level = self.required(InterStor, &key)?;
                    let expr = LinearExpr::from(level) - cap.clone();
                    let name = format!("{}:{}", row(family, &key), InterStor);
                    self.add(family, name, expr, Sense::Le, 0.0);
                }
                for &i in &sets.i {
                    let k = self.representative(i)?;
                    let carried = self.required(InterStor, &key![&tech.sector, energy, i - 1, node])?;
                    let start = self.required(IntraStor, &key![&tech.sector, energy, first, k, node])?;
                    for &t in &sets.t_e {
                        let within = self.required(IntraStor, &key![&tech.sector, energy, t, k, node])?;
                        let mut level = LinearExpr::term(carried, 1.0);
                        level.add_term(within, 1.0);
                        level.add_term(start, -1.0);
                        let key = key![&tech.sector, energy, i, t, node];
                        let name = row(family, &key);
                        let headroom = level.clone() - cap.clone();
                        self.add(family, format!("{}:max", name), headroom, Sense::Le, 0.0);
                        self.add(family, format!("{}:min", name), level, Sense::Ge, 0.0);
                    }
                }
            }
        }
        Ok(())
    }

    /// One-based representative period of chronological period `i`.
    fn representative(&self, i: i64) -> CepResult<i64> {
        self.sets
            .period_sequence
            .get((i - 1) as usize)
            .map(|k| *k as i64 + 1)
            .ok_or_else(|| {
                CepError::MissingData(format!("no representative period for period {}", i))
            })
    }

    /// `L[t] - L[t-1] + Σ Δt · η_in · GEN[charge] + Σ Δt / η_out · GEN[discharge] = 0`
    fn storage_balance(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::StorageBalance;
        let sets = self.sets;
        let dt = self.ts.delta_t;
        for energy in &sets.tech_storage_energy {
            let tech = self.tech(energy)?;
            let eta_in = tech.efficiency.input();
            let eta_out = tech.efficiency.output();
            let chargers = self.storage_parts(energy, StoragePart::Charge);
            let dischargers = self.storage_parts(energy, StoragePart::Discharge);
            for node in &sets.node {
                for &k in &sets.k {
                    for &t in &sets.t {
                        let key = key![&tech.sector, energy, t, k, node];
                        let mut expr = LinearExpr::term(self.required(IntraStor, &key)?, 1.0);
                        let previous = key![&tech.sector, energy, t - 1, k, node];
                        expr.add_term(self.required(IntraStor, &previous)?, -1.0);
                        for charger in &chargers {
                            let gen = key![&tech.sector, &charger.name, t, k, node];
                            self.add_entry(&mut expr, Gen, &gen, dt * eta_in)?;
                        }
                        for discharger in &dischargers {
                            let gen = key![&tech.sector, &discharger.name, t, k, node];
                            self.add_entry(&mut expr, Gen, &gen, dt / eta_out)?;
                        }
                        self.add(family, row(family, &key), expr, Sense::Eq, 0.0);
                    }
                }
            }
        }
        Ok(())
    }

    /// Each representative period ends at the level it started with.
    fn storage_intra_cycle(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::StorageIntraCycle;
        let sets = self.sets;
        let (Some(&first), Some(&last)) = (sets.t_e.first(), sets.t_e.last()) else {
            return Ok(());
        };
        for energy in &sets.tech_storage_energy {
            let tech = self.tech(energy)?;
            for node in &sets.node {
                for &k in &sets.k {
                    let start = self.required(IntraStor, &key![&tech.sector, energy, first, k, node])?;
                    let end = self.required(IntraStor, &key![&tech.sector, energy, last, k, node])?;
                    let expr = LinearExpr::from(start) - LinearExpr::from(end);
                    self.add(family, row(family, &key![energy, k, node]), expr, Sense::Eq, 0.0);
                }
            }
        }
        Ok(())
    }

    /// Chronological level: each period adds the net change of its
    /// representative period.
    fn storage_inter_balance(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::StorageInterBalance;
        let sets = self.sets;
        let (Some(&first), Some(&last)) = (sets.t_e.first(), sets.t_e.last()) else {
            return Ok(());
        };
        for energy in &sets.tech_storage_energy {
            let tech = self.tech(energy)?;
            for node in &sets.node {
                for &i in &sets.i {
                    let k = self.representative(i)?;
                    let key = key![&tech.sector, energy, i, node];
                    let mut expr = LinearExpr::term(self.required(InterStor, &key)?, 1.0);
                    let previous = key![&tech.sector, energy, i - 1, node];
                    expr.add_term(self.required(InterStor, &previous)?, -1.0);
                    let end = self.required(IntraStor, &key![&tech.sector, energy, last, k, node])?;
                    let start = self.required(IntraStor, &key![&tech.sector, energy, first, k, node])?;
                    expr.add_term(end, -1.0);
                    expr.add_term(start, 1.0);
                    self.add(family, row(family, &key), expr, Sense::Eq, 0.0);
                }
            }
        }
        Ok(())
    }

    fn storage_inter_cycle(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::StorageInterCycle;
        let sets = self.sets;
        let (Some(&first), Some(&last)) = (sets.i_e.first(), sets.i_e.last()) else {
            return Ok(());
        };
        for energy in &sets.tech_storage_energy {
            let tech = self.tech(energy)?;
            for node in &sets.node {
                let start = self.required(InterStor, &key![&tech.sector, energy, first, node])?;
                let end = self.required(InterStor, &key![&tech.sector, energy, last, node])?;
                let expr = LinearExpr::from(start) - LinearExpr::from(end);
                self.add(family, row(family, &key![energy, node]), expr, Sense::Eq, 0.0);
            }
        }
        Ok(())
    }

    /// Per-direction and combined flow within the line capacity.
    fn transmission_flow_limit(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::TransmissionFlowLimit;
        let sets = self.sets;
        for tech_name in &sets.tech_transmission {
            let tech = self.tech(tech_name)?;
            for line in self.lines_of(tech_name) {
                let capacity = self.trans_total(tech_name, &line.name)?;
                for &k in &sets.k {
                    for &t in &sets.t {
                        let along = key![&tech.sector, UNIFORM, tech_name, t, k, &line.name];
                        let against = key![&tech.sector, OPPOSITE, tech_name, t, k, &line.name];
                        let fu = self.required(Flow, &along)?;
                        let fo = self.required(Flow, &against)?;
                        let rows = [
                            (along, LinearExpr::from(fu)),
                            (against, LinearExpr::from(fo)),
                            (
                                key![&tech.sector, "total", tech_name, t, k, &line.name],
                                LinearExpr::from(fu) + LinearExpr::from(fo),
                            ),
                        ];
                        for (key, flow) in rows {
                            let expr = flow - capacity.clone();
                            self.add(family, row(family, &key), expr, Sense::Le, 0.0);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// `FLOW[uniform] - FLOW[opposite] = (θ_start - θ_end) / x`
    fn dc_power_flow(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::DcPowerFlow;
        let sets = self.sets;
        for tech_name in &sets.tech_transmission {
            let tech = self.tech(tech_name)?;
            for line in self.lines_of(tech_name) {
                let susceptance = 1.0 / line.reactance;
                for &k in &sets.k {
                    for &t in &sets.t {
                        let along = key![&tech.sector, UNIFORM, tech_name, t, k, &line.name];
                        let against = key![&tech.sector, OPPOSITE, tech_name, t, k, &line.name];
                        let mut expr = LinearExpr::term(self.required(Flow, &along)?, 1.0);
                        expr.add_term(self.required(Flow, &against)?, -1.0);
                        let start = key![&tech.sector, t, k, &line.node_start];
                        let end = key![&tech.sector, t, k, &line.node_end];
                        expr.add_term(self.required(Theta, &start)?, -susceptance);
                        expr.add_term(self.required(Theta, &end)?, susceptance);
                        let key = key![&tech.sector, tech_name, t, k, &line.name];
                        self.add(family, row(family, &key), expr, Sense::Eq, 0.0);
                    }
                }
            }
        }
        Ok(())
    }

    /// Supply meets demand at every node and step. Line losses are charged to
    /// the receiving end.
    fn energy_balance(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::EnergyBalance;
        let sets = self.sets;
        let flows_declared = self.vars.contains_key(&Flow);
        for sector in &sets.sector {
            let dispatch: Vec<&String> = sets
                .tech_dispatch
                .iter()
                .filter(|t| self.techs.get(t.as_str()).map_or(false, |tech| tech.sector == *sector))
                .collect();
            let mut links = Vec::new();
            if flows_declared {
                for tech_name in &sets.tech_transmission {
                    let tech = self.tech(tech_name)?;
                    if tech.sector != *sector {
                        continue;
                    }
                    let eta = tech.efficiency.output();
                    for line in self.lines_of(tech_name) {
                        links.push((tech_name, eta, line));
                    }
                }
            }
            for node in &sets.node {
                let series = demand_key(sector, node);
                for (ki, &k) in sets.k.iter().enumerate() {
                    for (ti, &t) in sets.t.iter().enumerate() {
                        let demand = self.ts.value(&series, ki, ti)?;
                        let mut expr = LinearExpr::new();
                        for tech_name in &dispatch {
                            let gen = key![sector, *tech_name, t, k, node];
                            self.add_entry(&mut expr, Gen, &gen, 1.0)?;
                        }
                        for (tech_name, eta, line) in &links {
                            let along = key![sector, UNIFORM, *tech_name, t, k, &line.name];
                            let against = key![sector, OPPOSITE, *tech_name, t, k, &line.name];
                            let (coef_along, coef_against) = if line.node_start == *node {
                                (-1.0, *eta)
                            } else if line.node_end == *node {
                                (*eta, -1.0)
                            } else {
                                continue;
                            };
                            self.add_entry(&mut expr, Flow, &along, coef_along)?;
                            self.add_entry(&mut expr, Flow, &against, coef_against)?;
                        }
                        let key = key![sector, t, k, node];
                        self.add_entry(&mut expr, Slack, &key, 1.0)?;
                        self.add(family, row(family, &key), expr, Sense::Eq, demand);
                    }
                }
            }
        }
        Ok(())
    }

    /// `LL[sector] - Σ w_k · Δt · SLACK = 0`
    fn lost_load_accounting(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::LostLoadAccounting;
        let sets = self.sets;
        let dt = self.ts.delta_t;
        for sector in &sets.sector {
            let key = key![sector];
            let mut expr = LinearExpr::term(self.required(LostLoad, &key)?, 1.0);
            for (ki, &k) in sets.k.iter().enumerate() {
                let coef = -self.weight(ki) * dt;
                for &t in &sets.t {
                    for node in &sets.node {
                        self.add_entry(&mut expr, Slack, &key![sector, t, k, node], coef)?;
                    }
                }
            }
            self.add(family, row(family, &key), expr, Sense::Eq, 0.0);
        }
        Ok(())
    }

    fn pin_to_zero(
        &mut self,
        family: ConstraintFamily,
        name: VariableName,
        labels: &[String],
    ) -> CepResult<()> {
        for label in labels {
            let key = key![label];
            let var = self.required(name, &key)?;
            self.add(family, row(family, &key), var.into(), Sense::Eq, 0.0);
        }
        Ok(())
    }

    /// Total emissions of the budget category, less what is bought back as
    /// lost emission, stay below the specific limit times weighted demand.
    fn emission_budget(&mut self) -> CepResult<()> {
        let family = ConstraintFamily::EmissionBudget;
        let sets = self.sets;
        let config = self.config;
        let (Some(limit), category) = (config.emission_limit, &config.emission_category) else {
            return Ok(());
        };
        let mut demand = 0.0;
        for sector in &sets.sector {
            for node in &sets.node {
                demand += self.ts.weighted_sum(&demand_key(sector, node))?;
            }
        }
        let mut expr = LinearExpr::new();
        for account in &sets.account {
            for tech in &sets.tech {
                self.add_entry(&mut expr, Cost, &key![account, category, tech], 1.0)?;
            }
        }
        self.add_entry(&mut expr, LostEmission, &key![category], -1.0)?;
        self.add(family, row(family, &key![category]), expr, Sense::Le, limit * demand);
        Ok(())
    }

    /// `Σ COST[·,monetary,·] + lost_load_price · Σ LL + lost_emission_price · Σ LE`
    pub(super) fn set_objective(&mut self) -> CepResult<()> {
        let sets = self.sets;
        let mut objective = LinearExpr::new();
        for account in &sets.account {
            for tech in &sets.tech {
                let key = key![account, &sets.impact_monetary, tech];
                self.add_entry(&mut objective, Cost, &key, 1.0)?;
            }
        }
        if let Some(price) = self.config.lost_load_price {
            for sector in &sets.sector {
                self.add_entry(&mut objective, LostLoad, &key![sector], price)?;
            }
        }
        if let Some(price) = self.config.lost_emission_price {
            for category in &sets.impact_emission {
                self.add_entry(&mut objective, LostEmission, &key![category], price)?;
            }
        }
        self.problem.objective = objective.compact();
        Ok(())
    }
}
