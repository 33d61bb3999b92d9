//! Declaration plan
//!
//! The plan fixes, from the configuration alone, which variable collections
//! are declared and which constraint families are emitted. It is computed
//! before any array is allocated and is stored with the model and the result
//! so the active feature set can be inspected afterwards.

use std::fmt::Write as _;

use cep_core::{ModelConfig, StorageMode, VariableName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    CostCapital,
    CostFixed,
    CostVariable,
    ExistingInfrastructure,
    CapacityLimit,
    FixedDesign,
    GenerationBound,
    StorageChargeBound,
    StorageDischargeBound,
    StorageLevelBound,
    StorageBalance,
    StorageIntraCycle,
    StorageInterBalance,
    StorageInterCycle,
    TransmissionFlowLimit,
    DcPowerFlow,
    EnergyBalance,
    LostLoadAccounting,
    LostLoadDisabled,
    LostEmissionDisabled,
    EmissionBudget,
}

impl ConstraintFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintFamily::CostCapital => "cost_capital",
            ConstraintFamily::CostFixed => "cost_fixed",
            ConstraintFamily::CostVariable => "cost_variable",
            ConstraintFamily::ExistingInfrastructure => "existing_infrastructure",
            ConstraintFamily::CapacityLimit => "capacity_limit",
            ConstraintFamily::FixedDesign => "fixed_design",
            ConstraintFamily::GenerationBound => "generation_bound",
            ConstraintFamily::StorageChargeBound => "storage_charge_bound",
            ConstraintFamily::StorageDischargeBound => "storage_discharge_bound",
            ConstraintFamily::StorageLevelBound => "storage_level_bound",
            ConstraintFamily::StorageBalance => "storage_balance",
            ConstraintFamily::StorageIntraCycle => "storage_intra_cycle",
            ConstraintFamily::StorageInterBalance => "storage_inter_balance",
            ConstraintFamily::StorageInterCycle => "storage_inter_cycle",
            ConstraintFamily::TransmissionFlowLimit => "transmission_flow_limit",
            ConstraintFamily::DcPowerFlow => "dc_power_flow",
            ConstraintFamily::EnergyBalance => "energy_balance",
            ConstraintFamily::LostLoadAccounting => "lost_load_accounting",
            ConstraintFamily::LostLoadDisabled => "lost_load_disabled",
            ConstraintFamily::LostEmissionDisabled => "lost_emission_disabled",
            ConstraintFamily::EmissionBudget => "emission_budget",
        }
    }

    /// Equation in the notation of the variable collections.
    pub fn equation(&self) -> &'static str {
        match self {
            ConstraintFamily::CostCapital => {
                "COST[cap,impact,tech] = Σ cost_cap · (annuity | 1/lifetime) · CAP[tech,new,node] (TRANS · length for lines)"
            }
            ConstraintFamily::CostFixed => {
                "COST[fix,impact,tech] = Σ cost_fix · CAP[tech,new,node] (TRANS · length for lines)"
            }
            ConstraintFamily::CostVariable => {
                "COST[var,impact,tech] = Σ w_k · Δt · cost_var · |GEN| (FLOW for lines)"
            }
            ConstraintFamily::ExistingInfrastructure => {
                "CAP[tech,ex,node] = power_ex (0 when existing infrastructure is excluded); same for TRANS"
            }
            ConstraintFamily::CapacityLimit => "CAP[ex] + CAP[new] ≤ power_lim; same for TRANS",
            ConstraintFamily::FixedDesign => "CAP = CAP_fixed, TRANS = TRANS_fixed",
            ConstraintFamily::GenerationBound => "GEN ≤ availability · (CAP[ex] + CAP[new])",
            ConstraintFamily::StorageChargeBound => "GEN[charge] ≥ -(CAP[ex] + CAP[new])",
            ConstraintFamily::StorageDischargeBound => "GEN[discharge] ≤ CAP[ex] + CAP[new]",
            ConstraintFamily::StorageLevelBound => "INTRASTOR, INTERSTOR ≤ CAP[ex] + CAP[new] of the reservoir",
            ConstraintFamily::StorageBalance => {
                "INTRASTOR[t] = INTRASTOR[t-1] - Δt · (η_in · GEN[charge] + GEN[discharge] / η_out)"
            }
            ConstraintFamily::StorageIntraCycle => "INTRASTOR[0,k] = INTRASTOR[T,k]",
            ConstraintFamily::StorageInterBalance => {
                "INTERSTOR[i] = INTERSTOR[i-1] + INTRASTOR[T,k(i)] - INTRASTOR[0,k(i)]"
            }
            ConstraintFamily::StorageInterCycle => "INTERSTOR[0] = INTERSTOR[I]",
            ConstraintFamily::TransmissionFlowLimit => {
                "FLOW[uniform], FLOW[opposite], FLOW[uniform] + FLOW[opposite] ≤ TRANS[ex] + TRANS[new]"
            }
            ConstraintFamily::DcPowerFlow => {
                "FLOW[uniform] - FLOW[opposite] = (THETA[start] - THETA[end]) / reactance"
            }
            ConstraintFamily::EnergyBalance => {
                "Σ GEN + Σ η · FLOW_in - Σ FLOW_out + SLACK = demand"
            }
            ConstraintFamily::LostLoadAccounting => "LL[sector] = Σ w_k · Δt · SLACK",
            ConstraintFamily::LostLoadDisabled => "LL[sector] = 0",
            ConstraintFamily::LostEmissionDisabled => "LE[impact] = 0",
            ConstraintFamily::EmissionBudget => {
                "Σ COST[·,emission,·] - LE[emission] ≤ emission_limit · Σ weighted demand"
            }
        }
    }
}

impl std::fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which collections and families one assembly produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationPlan {
    pub variables: Vec<VariableName>,
    pub families: Vec<ConstraintFamily>,
}

impl DeclarationPlan {
    pub fn from_config(config: &ModelConfig) -> Self {
        use ConstraintFamily::*;

        let storage = config.storage_mode.is_enabled();
        let interperiod = config.storage_mode == StorageMode::Interperiod;
        let transmission = config.allow_transmission;
        let fixed = config.fixed_design_variables.is_some();

        let mut variables = vec![VariableName::Cost, VariableName::Cap, VariableName::Gen];
        if storage {
            variables.push(VariableName::IntraStor);
        }
        if interperiod {
            variables.push(VariableName::InterStor);
        }
        if transmission {
            variables.push(VariableName::Flow);
            variables.push(VariableName::Trans);
        }
        if transmission && config.dc_power_flow {
            variables.push(VariableName::Theta);
        }
        variables.extend([
            VariableName::Slack,
            VariableName::LostLoad,
            VariableName::LostEmission,
        ]);

        let mut families = vec![CostCapital, CostFixed, CostVariable];
        if fixed {
            families.push(FixedDesign);
        } else {
            families.push(ExistingInfrastructure);
            families.push(CapacityLimit);
        }
        families.push(GenerationBound);
        if storage {
            families.extend([
                StorageChargeBound,
                StorageDischargeBound,
                StorageLevelBound,
                StorageBalance,
            ]);
            if interperiod {
                families.extend([StorageInterBalance, StorageInterCycle]);
            } else {
                families.push(StorageIntraCycle);
            }
        }
        if transmission {
            families.push(TransmissionFlowLimit);
            if config.dc_power_flow {
                families.push(DcPowerFlow);
            }
        }
        families.push(EnergyBalance);
        families.push(LostLoadAccounting);
        if config.lost_load_price.is_none() {
            families.push(LostLoadDisabled);
        }
        if config.lost_emission_price.is_none() {
            families.push(LostEmissionDisabled);
        }
        if config.emission_limit.is_some() {
            families.push(EmissionBudget);
        }

        Self {
            variables,
            families,
        }
    }

    pub fn declares(&self, name: VariableName) -> bool {
        self.variables.contains(&name)
    }

    pub fn is_active(&self, family: ConstraintFamily) -> bool {
        self.families.contains(&family)
    }

    /// Human-readable summary of the model: toggles, collections, equations.
    pub fn describe(&self, config: &ModelConfig) -> String {
        let price = |p: Option<f64>| p.map_or("unbounded".to_string(), |v| v.to_string());
        let mut out = String::new();
        let _ = writeln!(out, "capacity expansion model '{}'", config.descriptor);
        let _ = writeln!(
            out,
            "storage: {}, transmission: {}, dc power flow: {}, existing infrastructure: {}",
            config.storage_mode.as_str(),
            config.allow_transmission,
            config.dc_power_flow,
            config.include_existing_infrastructure
        );
        let _ = writeln!(
            out,
            "emission limit: {} ({}), lost load price: {}, lost emission price: {}",
            config
                .emission_limit
                .map_or("none".to_string(), |v| v.to_string()),
            config.emission_category,
            price(config.lost_load_price),
            price(config.lost_emission_price)
        );
        let names: Vec<&str> = self.variables.iter().map(VariableName::as_str).collect();
        let _ = writeln!(out, "variables: {}", names.join(", "));
        out.push_str("objective: min Σ COST[·,monetary,·] + lost_load_price · Σ LL + lost_emission_price · Σ LE\n");
        for family in &self.families {
            let _ = writeln!(out, "{}: {}", family.as_str(), family.equation());
        }
        out
    }
}
