//! Index-set derivation
//!
//! Every set that parameterizes the model is computed here from the input
//! data, the aggregation result and the configuration. Sets are plain ordered
//! vectors following input declaration order, so identical inputs always give
//! identically ordered sets. Nothing here is recomputed during assembly.

use cep_core::{
    availability_key, demand_key, Account, Axis, CepError, CepResult, ClusteredTimeSeries,
    InputData, Label, ModelConfig, StorageMode, StoragePart, TechCategory,
};
use serde::{Deserialize, Serialize};

/// Infrastructure status labels.
pub const EXISTING: &str = "ex";
pub const NEW: &str = "new";

/// Flow direction labels: along the line (start to end) and against it.
pub const UNIFORM: &str = "uniform";
pub const OPPOSITE: &str = "opposite";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSets {
    /// Generation technologies.
    pub tech_generation: Vec<String>,
    /// Storage reservoirs (energy capacity).
    pub tech_storage_energy: Vec<String>,
    pub tech_storage_charge: Vec<String>,
    pub tech_storage_discharge: Vec<String>,
    /// Transmission technologies (empty unless transmission is allowed).
    pub tech_transmission: Vec<String>,
    /// Technologies with node-based capacity: generation and all storage parts.
    pub tech_node: Vec<String>,
    /// Technologies with a generation variable: generation, chargers, dischargers.
    pub tech_dispatch: Vec<String>,
    /// Every technology in the model.
    pub tech: Vec<String>,
    pub node: Vec<String>,
    /// Lines (empty unless transmission is allowed).
    pub line: Vec<String>,
    pub sector: Vec<String>,
    /// Time steps `1..=T`.
    pub t: Vec<i64>,
    /// Storage level points `0..=T`.
    pub t_e: Vec<i64>,
    /// Representative periods `1..=K`.
    pub k: Vec<i64>,
    /// Chronological periods `1..=I` (empty unless storage is interperiod).
    pub i: Vec<i64>,
    /// Inter-period level points `0..=I` (empty unless storage is interperiod).
    pub i_e: Vec<i64>,
    /// Zero-based representative period of each chronological period.
    pub period_sequence: Vec<usize>,
    pub dir: Vec<String>,
    pub account: Vec<String>,
    /// All impact categories, monetary first.
    pub impact: Vec<String>,
    pub impact_monetary: String,
    pub impact_emission: Vec<String>,
    pub infrastruct: Vec<String>,
    /// Cost year the model reads from the cost table.
    pub year: i64,
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|s| s == value) {
        set.push(value.to_string());
    }
}

impl IndexSets {
    /// Derive all sets. Fails before anything is declared when the
    /// configuration contradicts the data or required data is absent.
    pub fn derive(
        data: &InputData,
        ts: &ClusteredTimeSeries,
        config: &ModelConfig,
    ) -> CepResult<Self> {
        config.validate()?;
        ts.validate()?;

        let storage = config.storage_mode.is_enabled();
        let mut sets = IndexSets {
            tech_generation: Vec::new(),
            tech_storage_energy: Vec::new(),
            tech_storage_charge: Vec::new(),
            tech_storage_discharge: Vec::new(),
            tech_transmission: Vec::new(),
            tech_node: Vec::new(),
            tech_dispatch: Vec::new(),
            tech: Vec::new(),
            node: data.node_labels().iter().map(ToString::to_string).collect(),
            line: Vec::new(),
            sector: Vec::new(),
            t: (1..=ts.steps_per_period as i64).collect(),
            t_e: (0..=ts.steps_per_period as i64).collect(),
            k: (1..=ts.period_count() as i64).collect(),
            i: Vec::new(),
            i_e: Vec::new(),
            period_sequence: Vec::new(),
            dir: Vec::new(),
            account: Account::ALL.iter().map(|a| a.as_str().to_string()).collect(),
            impact: Vec::new(),
            impact_monetary: String::new(),
            impact_emission: Vec::new(),
            infrastruct: vec![EXISTING.to_string(), NEW.to_string()],
            year: 0,
        };

        if sets.node.is_empty() {
            return Err(CepError::MissingData("no nodes declared".into()));
        }

        for tech in data.technologies() {
            let included = match tech.category {
                TechCategory::Generation => {
                    sets.tech_generation.push(tech.name.clone());
                    true
                }
                TechCategory::Storage(part) if storage => {
                    match part {
                        StoragePart::Energy => sets.tech_storage_energy.push(tech.name.clone()),
                        StoragePart::Charge => sets.tech_storage_charge.push(tech.name.clone()),
                        StoragePart::Discharge => {
                            sets.tech_storage_discharge.push(tech.name.clone())
                        }
                    }
                    true
                }
                TechCategory::Transmission if config.allow_transmission => {
                    sets.tech_transmission.push(tech.name.clone());
                    true
                }
                _ => false,
            };
            if included {
                sets.tech.push(tech.name.clone());
                push_unique(&mut sets.sector, &tech.sector);
                if !tech.category.is_transmission() {
                    sets.tech_node.push(tech.name.clone());
                }
                if tech.category.storage_part() != Some(StoragePart::Energy)
                    && !tech.category.is_transmission()
                {
                    sets.tech_dispatch.push(tech.name.clone());
                }
            }
        }

        if storage {
            if sets.tech_storage_energy.is_empty() {
                return Err(CepError::InvalidConfiguration(format!(
                    "storage_mode '{}' requested but no storage technology is declared",
                    config.storage_mode.as_str()
                )));
            }
            for energy in &sets.tech_storage_energy {
                let has_part = |part: StoragePart| {
                    data.technologies().any(|t| {
                        t.category == TechCategory::Storage(part)
                            && t.storage_unit.as_deref() == Some(energy.as_str())
                    })
                };
                if !has_part(StoragePart::Charge) || !has_part(StoragePart::Discharge) {
                    return Err(CepError::MissingData(format!(
                        "storage reservoir '{}' needs both a charge and a discharge technology",
                        energy
                    )));
                }
            }
        }

        if config.storage_mode == StorageMode::Interperiod {
            sets.period_sequence = ts.sequence();
            let n = sets.period_sequence.len() as i64;
            sets.i = (1..=n).collect();
            sets.i_e = (0..=n).collect();
        }

        if config.allow_transmission {
            if data.lines().is_empty() {
                return Err(CepError::InvalidConfiguration(
                    "allow_transmission is set but no lines are declared".into(),
                ));
            }
            for line in data.lines().values() {
                if config.dc_power_flow && !(line.reactance > 0.0) {
                    return Err(CepError::InvalidData(format!(
                        "line '{}' needs a positive reactance for DC power flow",
                        line.name
                    )));
                }
                sets.line.push(line.name.clone());
            }
            sets.dir = vec![UNIFORM.to_string(), OPPOSITE.to_string()];
        }

        let impacts = data.impacts();
        sets.impact = impacts.all();
        sets.impact_monetary = impacts.monetary;
        sets.impact_emission = impacts.emissions;

        sets.year = match config.year {
            Some(year) => {
                if !data.years().contains(&Label::Int(year)) {
                    return Err(CepError::MissingData(format!(
                        "cost table has no entries for year {}",
                        year
                    )));
                }
                year
            }
            None => data
                .years()
                .first()
                .and_then(Label::as_int)
                .ok_or_else(|| CepError::MissingData("cost table has no years".into()))?,
        };

        if config.emission_limit.is_some()
            && !sets.impact_emission.contains(&config.emission_category)
        {
            return Err(CepError::MissingData(format!(
                "emission limit set but cost table has no '{}' impact",
                config.emission_category
            )));
        }

        sets.check_series(data, ts)?;
        Ok(sets)
    }

    /// Demand per (sector, node) and availability for every applicable
    /// (dispatch technology, node) pair must be present.
    fn check_series(&self, data: &InputData, ts: &ClusteredTimeSeries) -> CepResult<()> {
        for sector in &self.sector {
            for node in &self.node {
                let key = demand_key(sector, node);
                if !ts.has_series(&key) {
                    return Err(CepError::MissingData(format!(
                        "demand series '{}' not provided",
                        key
                    )));
                }
            }
        }
        for tech_name in &self.tech_generation {
            let tech = data.tech(tech_name)?;
            let Some(series) = &tech.time_series else {
                continue;
            };
            for node in &self.node {
                let node_data = data.node(tech_name, node)?;
                let applicable = node_data.power_ex > 0.0 || node_data.power_lim != Some(0.0);
                let key = availability_key(series, node);
                if applicable && !ts.has_series(&key) {
                    return Err(CepError::MissingData(format!(
                        "availability series '{}' for '{}' not provided",
                        key, tech_name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Axis over one of the sets, named as it appears on variable arrays.
    ///
    /// Technology subsets all become a "tech" axis; `t_e` and `i_e` become
    /// "t" and "i".
    pub fn axis(&self, set: &str) -> CepResult<Axis> {
        let strings = |name: &str, values: &[String]| Axis::new(name, values.iter().cloned());
        let ints = |name: &str, values: &[i64]| Axis::new(name, values.iter().copied());
        match set {
            "tech" => strings("tech", &self.tech),
            "tech_node" => strings("tech", &self.tech_node),
            "tech_dispatch" => strings("tech", &self.tech_dispatch),
            "tech_storage_energy" => strings("tech", &self.tech_storage_energy),
            "tech_transmission" => strings("tech", &self.tech_transmission),
            "node" => strings("node", &self.node),
            "line" => strings("line", &self.line),
            "sector" => strings("sector", &self.sector),
            "dir" => strings("dir", &self.dir),
            "account" => strings("account", &self.account),
            "impact" => strings("impact", &self.impact),
            "impact_emission" => strings("impact", &self.impact_emission),
            "infrastruct" => strings("infrastruct", &self.infrastruct),
            "t" => ints("t", &self.t),
            "t_e" => ints("t", &self.t_e),
            "k" => ints("k", &self.k),
            "i_e" => ints("i", &self.i_e),
            other => Err(CepError::AxisMismatch(format!("unknown index set '{}'", other))),
        }
    }

    /// Axes for a list of sets, in order.
    pub fn axes(&self, sets: &[&str]) -> CepResult<Vec<Axis>> {
        sets.iter().map(|s| self.axis(s)).collect()
    }

    pub fn period_weight(&self, ts: &ClusteredTimeSeries, k: usize) -> f64 {
        ts.weights.get(k).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cep_core::{LineData, NodeData, Technology};

    fn data() -> InputData {
        InputData::builder("EUR")
            .tech(Technology::generation("pv", "el").with_time_series("solar"))
            .tech(Technology::generation("gas", "el"))
            .techs(Technology::storage_unit("bat", "el", 0.95, 0.95))
            .tech(Technology::transmission("ac", "el"))
            .node("n1")
            .node("n2")
            .node_data("pv", "n1", NodeData::new(0.0, None))
            .node_data("gas", "n1", NodeData::new(0.0, None))
            .line(LineData::new("l1", "ac", "n1", "n2").with_impedance(0.1, 0.01))
            .cost("gas", "n1", 2030, Account::Variable, "CO2", 400.0)
            .cost("gas", "n1", 2030, Account::Capital, "EUR", 500.0)
            .build()
            .unwrap()
    }

    fn ts() -> ClusteredTimeSeries {
        ClusteredTimeSeries::new(vec![2.0, 1.0], 3)
            .with_flat_series("el_demand-n1", 10.0)
            .with_flat_series("el_demand-n2", 5.0)
            .with_flat_series("solar-n1", 0.5)
    }

    #[test]
    fn sets_depend_on_toggles() {
        let base = IndexSets::derive(&data(), &ts(), &ModelConfig::default()).unwrap();
        assert_eq!(base.tech, vec!["pv", "gas"]);
        assert!(base.line.is_empty());
        assert!(base.dir.is_empty());
        assert_eq!(base.t, vec![1, 2, 3]);
        assert_eq!(base.t_e, vec![0, 1, 2, 3]);
        assert_eq!(base.k, vec![1, 2]);
        assert_eq!(base.year, 2030);
        assert_eq!(base.impact, vec!["EUR", "CO2"]);

        let full = ModelConfig::default()
            .with_storage(StorageMode::Interperiod)
            .with_transmission(true);
        let sets = IndexSets::derive(&data(), &ts(), &full).unwrap();
        assert_eq!(sets.tech, vec!["pv", "gas", "bat_e", "bat_in", "bat_out", "ac"]);
        assert_eq!(sets.tech_node, vec!["pv", "gas", "bat_e", "bat_in", "bat_out"]);
        assert_eq!(sets.tech_dispatch, vec!["pv", "gas", "bat_in", "bat_out"]);
        assert_eq!(sets.line, vec!["l1"]);
        assert_eq!(sets.dir, vec![UNIFORM, OPPOSITE]);
        assert_eq!(sets.period_sequence, vec![0, 0, 1]);
        assert_eq!(sets.i_e, vec![0, 1, 2, 3]);
    }

    #[test]
    fn derivation_is_deterministic() {
        let config = ModelConfig::default()
            .with_storage(StorageMode::Intraperiod)
            .with_transmission(true);
        let a = IndexSets::derive(&data(), &ts(), &config).unwrap();
        let b = IndexSets::derive(&data(), &ts(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn transmission_without_lines_is_invalid() {
        let no_lines = InputData::builder("EUR")
            .tech(Technology::generation("gas", "el"))
            .node("n1")
            .cost("gas", "n1", 2030, Account::Capital, "EUR", 1.0)
            .build()
            .unwrap();
        let config = ModelConfig::default().with_transmission(true);
        let err = IndexSets::derive(&no_lines, &ts(), &config).unwrap_err();
        assert!(matches!(err, CepError::InvalidConfiguration(_)));
    }

    #[test]
    fn storage_mode_without_storage_is_invalid() {
        let no_storage = InputData::builder("EUR")
            .tech(Technology::generation("gas", "el"))
            .node("n1")
            .node("n2")
            .cost("gas", "n1", 2030, Account::Capital, "EUR", 1.0)
            .build()
            .unwrap();
        let config = ModelConfig::default().with_storage(StorageMode::Intraperiod);
        let err = IndexSets::derive(&no_storage, &ts(), &config).unwrap_err();
        assert!(matches!(err, CepError::InvalidConfiguration(_)));
    }

    #[test]
    fn missing_series_and_categories_are_reported() {
        let no_solar = ClusteredTimeSeries::new(vec![1.0], 3)
            .with_flat_series("el_demand-n1", 10.0)
            .with_flat_series("el_demand-n2", 5.0);
        let err = IndexSets::derive(&data(), &no_solar, &ModelConfig::default()).unwrap_err();
        assert!(matches!(err, CepError::MissingData(ref m) if m.contains("solar-n1")));

        let config = ModelConfig::default()
            .with_emission_limit(100.0)
            .with_emission_category("CH4");
        let err = IndexSets::derive(&data(), &ts(), &config).unwrap_err();
        assert!(matches!(err, CepError::MissingData(_)));

        let config = ModelConfig::default().with_year(2040);
        let err = IndexSets::derive(&data(), &ts(), &config).unwrap_err();
        assert!(matches!(err, CepError::MissingData(_)));
    }
}
