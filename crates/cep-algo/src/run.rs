//! Solve workflow: assemble, solve through a bounded backend call, package.

use std::collections::BTreeMap;
use std::sync::Arc;

use cep_core::{CepError, CepResult, ClusteredTimeSeries, InputData, ModelConfig, SolveFailure};
use cep_solver_common::{solve_bounded, LpSolution, SolutionStatus, SolveBackend, SolveOptions};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{CepModel, ModelBuilder};
use crate::result::OptResult;

/// Assemble and solve one configuration.
///
/// Assembly errors abort before the backend is called. A non-optimal solve
/// is returned as [`CepError::SolveFailed`] with a diagnostic where the
/// configuration points at a known failure pattern.
pub fn run_opt(
    data: &InputData,
    ts: &ClusteredTimeSeries,
    config: &ModelConfig,
    backend: Arc<dyn SolveBackend>,
    options: &SolveOptions,
) -> CepResult<OptResult> {
    let model = ModelBuilder::new(data, ts, config).build()?;
    solve_model(model, backend, options)
}

/// Solve an already assembled model.
pub fn solve_model(
    mut model: CepModel,
    backend: Arc<dyn SolveBackend>,
    options: &SolveOptions,
) -> CepResult<OptResult> {
    let backend_id = backend.id().to_string();
    let problem = Arc::new(std::mem::take(&mut model.problem));
    let outcome = solve_bounded(backend, Arc::clone(&problem), options);
    // A timed-out worker may still hold its reference
    model.problem = Arc::try_unwrap(problem).unwrap_or_else(|shared| (*shared).clone());

    let solution = outcome.map_err(|e| CepError::SolveFailed {
        status: SolveFailure::SolverError(e.to_string()),
        diagnostic: None,
    })?;
    check_status(&model.config, &solution)?;

    let result = OptResult::package(&model, &solution)?;
    info!(
        descriptor = %result.descriptor,
        backend = %backend_id,
        objective = result.objective,
        solve_time_ms = result.solve_time_ms,
        "capacity expansion solved"
    );
    Ok(result)
}

fn check_status(config: &ModelConfig, solution: &LpSolution) -> CepResult<()> {
    let (status, diagnostic) = match solution.status {
        SolutionStatus::Optimal => return Ok(()),
        SolutionStatus::Infeasible => (SolveFailure::Infeasible, diagnose_infeasible(config)),
        SolutionStatus::Unbounded => (
            SolveFailure::Unbounded,
            Some("objective unbounded below; check for negative cost coefficients".to_string()),
        ),
        SolutionStatus::Timeout => (SolveFailure::Timeout, solution.message.clone()),
        SolutionStatus::Cancelled => (SolveFailure::Cancelled, None),
        SolutionStatus::Error => (
            SolveFailure::SolverError(solution.message.clone().unwrap_or_default()),
            None,
        ),
    };
    warn!(
        descriptor = %config.descriptor,
        status = %status,
        diagnostic = diagnostic.as_deref().unwrap_or(""),
        "capacity expansion solve failed"
    );
    Err(CepError::SolveFailed { status, diagnostic })
}

/// Name the constraint families most likely behind an infeasible solve.
fn diagnose_infeasible(config: &ModelConfig) -> Option<String> {
    let fixed = config.fixed_design_variables.is_some();
    let hard_budget = config.emission_limit.is_some() && config.lost_emission_price.is_none();
    let hard_balance = config.lost_load_price.is_none();
    let text = match (fixed, hard_budget, hard_balance) {
        (true, true, _) => "emission budget plus fixed design infeasible",
        (true, false, true) => "fixed design cannot meet demand without lost-load slack",
        (true, false, false) => "fixed design violates storage or transmission limits",
        (false, true, _) => "emission budget infeasible without lost-emission slack",
        (false, false, true) => "energy balance infeasible without lost-load slack",
        (false, false, false) => return None,
    };
    Some(text.to_string())
}

/// Settings of the second, fixed-design stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchStage {
    /// Per-technology multiplier applied to the first-stage capacities.
    pub capacity_factors: BTreeMap<String, f64>,
    pub lost_load_price: Option<f64>,
    pub lost_emission_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDispatch {
    pub design: OptResult,
    pub dispatch: OptResult,
}

/// Two independent runs: a design run with `config` on the clustered
/// `design_ts`, then a dispatch run on `dispatch_ts` with the solved
/// capacities pinned and the stage's slack prices.
///
/// `dispatch_ts` is normally the full-resolution series the clusters were
/// drawn from, so the design is validated against every period rather than
/// only the representative ones. Passing `design_ts` again re-checks the
/// design on the clustered data.
pub fn run_design_dispatch(
    data: &InputData,
    design_ts: &ClusteredTimeSeries,
    dispatch_ts: &ClusteredTimeSeries,
    config: &ModelConfig,
    stage: &DispatchStage,
    backend: Arc<dyn SolveBackend>,
    options: &SolveOptions,
) -> CepResult<DesignDispatch> {
    let design = run_opt(data, design_ts, config, Arc::clone(&backend), options)?;
    let fixed = design.design_variables(&stage.capacity_factors)?;
    let dispatch_config =
        config.for_dispatch(fixed, stage.lost_load_price, stage.lost_emission_price);
    info!(
        descriptor = %dispatch_config.descriptor,
        periods = dispatch_ts.period_count(),
        steps = dispatch_ts.steps_per_period,
        "dispatching fixed design"
    );
    let dispatch = run_opt(data, dispatch_ts, &dispatch_config, backend, options)?;
    Ok(DesignDispatch { design, dispatch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cep_core::FixedDesign;

    #[test]
    fn infeasibility_diagnostics_follow_configuration() {
        let budget = ModelConfig::default().with_emission_limit(1.0);
        assert_eq!(
            diagnose_infeasible(&budget).as_deref(),
            Some("emission budget infeasible without lost-emission slack")
        );

        let fixed = budget.clone().with_fixed_design(FixedDesign::new());
        assert_eq!(
            diagnose_infeasible(&fixed).as_deref(),
            Some("emission budget plus fixed design infeasible")
        );

        let soft = ModelConfig::default()
            .with_lost_load_price(1e4)
            .with_lost_emission_price(1e3);
        assert_eq!(diagnose_infeasible(&soft), None);
    }

    #[test]
    fn non_optimal_status_becomes_solve_failed() {
        let solution = LpSolution::terminated(SolutionStatus::Infeasible, "infeasible", 3);
        let err = check_status(&ModelConfig::default(), &solution).unwrap_err();
        assert!(err.is_infeasible());
        assert!(err.to_string().contains("lost-load"));

        let solution = LpSolution::terminated(SolutionStatus::Error, "numerical trouble", 3);
        let err = check_status(&ModelConfig::default(), &solution).unwrap_err();
        assert!(matches!(
            err,
            CepError::SolveFailed { status: SolveFailure::SolverError(ref m), .. } if m == "numerical trouble"
        ));
    }
}
