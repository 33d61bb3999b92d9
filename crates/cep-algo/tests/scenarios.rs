//! End-to-end solves of small capacity expansion scenarios

mod common;

use cep_algo::{run_opt, ModelBuilder};
use cep_core::{CepError, Label, ModelConfig, SolveFailure, VariableKind, VariableName};
use cep_solver_common::SolveBackend;
use common::{approx, backend, flat_demand, key, options, single_node};

#[test]
fn single_node_builds_exactly_the_demand() {
    let data = single_node(0.0);
    let ts = flat_demand(50.0);
    let config = ModelConfig::default().with_descriptor("single");

    let result = run_opt(&data, &ts, &config, backend(), &options()).expect("solve");
    assert_eq!(result.descriptor, "single");

    let cap = result.variable(VariableName::Cap).unwrap();
    let new = *cap.values.get(&key(["gas", "new", "n1"])).unwrap();
    assert!(new >= 50.0 - 1e-4, "capacity {} below demand", new);

    let gen = result.variable(VariableName::Gen).unwrap();
    for t in 1..=4i64 {
        let k = vec![
            Label::from("el"),
            Label::from("gas"),
            Label::from(t),
            Label::from(1i64),
            Label::from("n1"),
        ];
        assert!(approx(*gen.values.get(&k).unwrap(), 50.0));
    }

    // capacity × (capital + fixed) with an annuity factor of one
    assert!(approx(result.objective, new * 1000.0));
    assert!(approx(result.total_cost("EUR").unwrap(), result.objective));

    for (name, slack) in result.slack_variables() {
        assert!(slack.values.sum().abs() < 1e-5, "{} should be zero", name);
    }
}

#[test]
fn energy_balance_holds_at_the_solution() {
    let data = single_node(0.0);
    let ts = flat_demand(50.0);
    let model = ModelBuilder::new(&data, &ts, &ModelConfig::default())
        .build()
        .unwrap();
    let solution = backend().solve(&model.problem).unwrap();
    assert!(solution.status.is_success());

    let rows: Vec<_> = model.problem.constraints_in("energy_balance").collect();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert!(row.violation(&solution.values) < 1e-5, "{} violated", row.name);
    }
    assert!(model.problem.max_violation(&solution.values) < 1e-5);
}

#[test]
fn excluded_existing_capacity_solves_to_zero() {
    let data = single_node(30.0);
    let ts = flat_demand(50.0);

    let config = ModelConfig::default().with_existing_infrastructure(true);
    let with = run_opt(&data, &ts, &config, backend(), &options()).unwrap();
    let cap = &with.variable(VariableName::Cap).unwrap().values;
    assert!(approx(*cap.get(&key(["gas", "ex", "n1"])).unwrap(), 30.0));
    assert!(approx(*cap.get(&key(["gas", "new", "n1"])).unwrap(), 20.0));
    // existing capacity carries no capital or fixed cost
    assert!(approx(with.objective, 20_000.0));

    let without = run_opt(&data, &ts, &ModelConfig::default(), backend(), &options()).unwrap();
    let cap = &without.variable(VariableName::Cap).unwrap().values;
    assert!(cap.get(&key(["gas", "ex", "n1"])).unwrap().abs() < 1e-6);
    assert!(approx(*cap.get(&key(["gas", "new", "n1"])).unwrap(), 50.0));
}

#[test]
fn emission_budget_without_slack_is_infeasible() {
    let data = single_node(0.0);
    let ts = flat_demand(50.0);
    // 0.5 t/MWh is unavoidable, the budget allows 0.25 t/MWh
    let config = ModelConfig::default().with_emission_limit(0.25);

    let err = run_opt(&data, &ts, &config, backend(), &options()).unwrap_err();
    assert!(err.is_infeasible(), "unexpected error: {}", err);
    match err {
        CepError::SolveFailed { diagnostic, .. } => assert_eq!(
            diagnostic.as_deref(),
            Some("emission budget infeasible without lost-emission slack")
        ),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn emission_budget_with_slack_price_binds() {
    let data = single_node(0.0);
    let ts = flat_demand(50.0);
    let config = ModelConfig::default()
        .with_emission_limit(0.25)
        .with_lost_emission_price(1_000.0);

    let result = run_opt(&data, &ts, &config, backend(), &options()).unwrap();
    let emitted = result.total_cost("CO2").unwrap();
    assert!(approx(emitted, 100.0));

    let lost = *result
        .variable(VariableName::LostEmission)
        .unwrap()
        .values
        .get(&key(["CO2"]))
        .unwrap();
    assert!(lost > 0.0);
    // emissions - lost emission == 0.25 t/MWh × 200 MWh
    assert!(approx(emitted - lost, 50.0));
    assert!(approx(result.objective, 50_000.0 + 1_000.0 * 50.0));
}

#[test]
fn unbounded_slack_prices_force_zero_slack() {
    let data = single_node(0.0);
    let ts = flat_demand(150.0);

    let err = run_opt(&data, &ts, &ModelConfig::default(), backend(), &options()).unwrap_err();
    assert!(matches!(
        err,
        CepError::SolveFailed {
            status: SolveFailure::Infeasible,
            ..
        }
    ));

    let feasible = flat_demand(80.0);
    let result = run_opt(&data, &feasible, &ModelConfig::default(), backend(), &options()).unwrap();
    for slack in result.variables_of_kind(VariableKind::Slack).values() {
        assert!(slack.values.values().iter().all(|v| v.abs() < 1e-6));
    }
}

#[test]
fn finite_lost_load_price_covers_the_shortfall() {
    let data = single_node(0.0);
    let ts = flat_demand(150.0);
    let config = ModelConfig::default().with_lost_load_price(1_000.0);

    let result = run_opt(&data, &ts, &config, backend(), &options()).unwrap();
    let lost = *result
        .variable(VariableName::LostLoad)
        .unwrap()
        .values
        .get(&key(["el"]))
        .unwrap();
    // 50 MW short for four hours
    assert!(approx(lost, 200.0));
    assert!(approx(result.objective, 100_000.0 + 200_000.0));
}
