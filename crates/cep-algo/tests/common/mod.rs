//! Shared fixtures for cep-algo integration tests

#![allow(dead_code)]

use std::sync::Arc;

use cep_algo::LpSolverKind;
use cep_core::{
    Account, ClusteredTimeSeries, Efficiency, InputData, Label, LineData, NodeData, Technology,
};
use cep_solver_common::{SolveBackend, SolveOptions};

pub const TOL: f64 = 1e-4;

pub fn backend() -> Arc<dyn SolveBackend> {
    LpSolverKind::Clarabel.backend()
}

pub fn options() -> SolveOptions {
    SolveOptions::default()
}

pub fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= TOL * expected.abs().max(1.0)
}

/// Key helper for result lookups.
pub fn key<const N: usize>(parts: [&str; N]) -> Vec<Label> {
    parts.iter().map(|p| Label::from(*p)).collect()
}

/// One node, one gas plant (limit 100 MW, existing `existing` MW), capital
/// 800 and fixed 200 EUR/MW, 0.5 t CO2 per MWh. Four one-hour steps in a
/// single period with flat demand.
pub fn single_node(existing: f64) -> InputData {
    InputData::builder("EUR")
        .region("test")
        .tech(Technology::generation("gas", "el"))
        .node("n1")
        .node_data("gas", "n1", NodeData::new(existing, Some(100.0)))
        .cost("gas", "n1", 2030, Account::Capital, "EUR", 800.0)
        .cost("gas", "n1", 2030, Account::Fixed, "EUR", 200.0)
        .cost("gas", "n1", 2030, Account::Variable, "CO2", 0.5)
        .build()
        .expect("single node data")
}

pub fn flat_demand(demand: f64) -> ClusteredTimeSeries {
    ClusteredTimeSeries::new(vec![1.0], 4).with_flat_series("el_demand-n1", demand)
}

/// Solar with a day and a night period, expensive gas backup and a cheap
/// battery. Moving solar energy from the day into the night period needs
/// storage across periods.
pub fn solar_battery() -> (InputData, ClusteredTimeSeries) {
    let data = InputData::builder("EUR")
        .tech(Technology::generation("pv", "el").with_time_series("solar"))
        .tech(Technology::generation("gas", "el"))
        .techs(Technology::storage_unit("bat", "el", 0.9, 0.9))
        .node("n1")
        .node_data("pv", "n1", NodeData::new(0.0, None))
        .node_data("gas", "n1", NodeData::new(0.0, None))
        .node_data("bat_e", "n1", NodeData::new(0.0, None))
        .node_data("bat_in", "n1", NodeData::new(0.0, None))
        .node_data("bat_out", "n1", NodeData::new(0.0, None))
        .cost("pv", "n1", 2030, Account::Capital, "EUR", 100.0)
        .cost("gas", "n1", 2030, Account::Capital, "EUR", 100.0)
        .cost("gas", "n1", 2030, Account::Variable, "EUR", 60.0)
        .cost("bat_e", "n1", 2030, Account::Capital, "EUR", 5.0)
        .cost("bat_in", "n1", 2030, Account::Capital, "EUR", 5.0)
        .cost("bat_out", "n1", 2030, Account::Capital, "EUR", 5.0)
        .build()
        .expect("solar battery data");
    let ts = ClusteredTimeSeries::new(vec![1.0, 1.0], 2)
        .with_flat_series("el_demand-n1", 10.0)
        .with_series("solar-n1", vec![vec![1.0, 1.0], vec![0.0, 0.0]]);
    (data, ts)
}

/// Gas at `n1` only, demand at `n2`, one 90 % efficient line with reactance 0.1.
pub fn two_nodes() -> (InputData, ClusteredTimeSeries) {
    let data = InputData::builder("EUR")
        .tech(Technology::generation("gas", "el"))
        .tech(Technology::transmission("ac", "el").with_efficiency(Efficiency::Conversion(0.9)))
        .node("n1")
        .node("n2")
        .node_data("gas", "n1", NodeData::new(0.0, None))
        .line(
            LineData::new("l1", "ac", "n1", "n2")
                .with_impedance(0.1, 0.01)
                .with_capacity(0.0, Some(200.0))
                .with_length(2.0),
        )
        .cost("gas", "n1", 2030, Account::Capital, "EUR", 500.0)
        .cost("ac", "n1", 2030, Account::Capital, "EUR", 10.0)
        .build()
        .expect("two node data");
    let ts = ClusteredTimeSeries::new(vec![1.0], 3)
        .with_flat_series("el_demand-n1", 0.0)
        .with_flat_series("el_demand-n2", 45.0);
    (data, ts)
}

/// PV and a lossless battery only. Representative period 1 has sun then
/// night, period 2 is dark throughout; both carry 1 MWh of demand in their
/// second step. The chronology `[1, 1, 2, 2]` forces a seasonal carry on top
/// of the daily swing.
pub fn seasonal_pv() -> (InputData, ClusteredTimeSeries) {
    let data = InputData::builder("EUR")
        .tech(Technology::generation("pv", "el").with_time_series("solar"))
        .techs(Technology::storage_unit("bat", "el", 1.0, 1.0))
        .node("n1")
        .node_data("pv", "n1", NodeData::new(0.0, None))
        .node_data("bat_e", "n1", NodeData::new(0.0, None))
        .node_data("bat_in", "n1", NodeData::new(0.0, None))
        .node_data("bat_out", "n1", NodeData::new(0.0, None))
        .cost("pv", "n1", 2030, Account::Capital, "EUR", 100.0)
        .cost("bat_e", "n1", 2030, Account::Capital, "EUR", 5.0)
        .cost("bat_in", "n1", 2030, Account::Capital, "EUR", 1.0)
        .cost("bat_out", "n1", 2030, Account::Capital, "EUR", 1.0)
        .build()
        .expect("seasonal pv data");
    let ts = ClusteredTimeSeries::new(vec![2.0, 2.0], 2)
        .with_series("el_demand-n1", vec![vec![0.0, 1.0], vec![0.0, 1.0]])
        .with_series("solar-n1", vec![vec![1.0, 0.0], vec![0.0, 0.0]])
        .with_period_sequence(vec![0, 0, 1, 1]);
    (data, ts)
}
