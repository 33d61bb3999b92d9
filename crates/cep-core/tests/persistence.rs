//! JSON persistence of input data and time series

use cep_core::{
    Account, ClusteredTimeSeries, Efficiency, InputData, LineData, NodeData, Technology,
};

fn sample() -> InputData {
    InputData::builder("EUR")
        .region("north")
        .tech(
            Technology::generation("wind", "el")
                .with_time_series("wind")
                .with_financing(20.0, 0.05),
        )
        .techs(Technology::storage_unit("bat", "el", 0.95, 0.95))
        .tech(Technology::transmission("ac", "el").with_efficiency(Efficiency::Conversion(0.97)))
        .node("n1")
        .node("n2")
        .node_data("wind", "n1", NodeData::new(10.0, Some(300.0)).at(54.3, 10.1))
        .line(LineData::new("l1", "ac", "n1", "n2").with_impedance(0.2, 0.02))
        .cost("wind", "n1", 2030, Account::Capital, "EUR", 1_200.0)
        .cost("wind", "n1", 2030, Account::Capital, "CO2", 15.0)
        .build()
        .unwrap()
}

#[test]
fn input_data_survives_json() {
    let data = sample();
    let text = serde_json::to_string(&data).unwrap();
    let back: InputData = serde_json::from_str(&text).unwrap();
    assert_eq!(back, data);
    assert_eq!(back.region(), "north");
    assert_eq!(
        back.cost("wind", "n1", 2030, Account::Capital, "CO2").unwrap(),
        15.0
    );
}

#[test]
fn annuity_factor_is_recomputed_not_read() {
    let data = sample();
    let mut value = serde_json::to_value(&data).unwrap();
    let text = value.to_string();
    assert!(!text.contains("annuity_factor"));

    // edit the discount rate in the serialized form and reload
    let techs = value["techs"]["data"].as_array_mut().unwrap();
    techs[0]["discount_rate"] = serde_json::json!(0.0);
    let back: InputData = serde_json::from_value(value).unwrap();
    let wind = back.tech("wind").unwrap();
    assert!((wind.annuity_factor() - 1.0 / 20.0).abs() < 1e-12);
}

#[test]
fn time_series_survive_json() {
    let ts = ClusteredTimeSeries::new(vec![200.0, 165.0], 3)
        .with_delta_t(2.0)
        .with_flat_series("el_demand-n1", 40.0)
        .with_series("wind-n1", vec![vec![0.1, 0.5, 0.9], vec![0.0, 0.2, 0.4]])
        .with_period_sequence(vec![0, 1, 1, 0]);
    let back: ClusteredTimeSeries =
        serde_json::from_str(&serde_json::to_string(&ts).unwrap()).unwrap();
    assert_eq!(back, ts);
    assert!(back.validate().is_ok());
    assert_eq!(back.sequence(), vec![0, 1, 1, 0]);
}
