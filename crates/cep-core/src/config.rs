//! Run configuration
//!
//! [`ModelConfig`] is the immutable set of toggles handed to the assembler.
//! It deserializes from TOML with defaults for every omitted field, so a sweep
//! file only needs to name what differs from the baseline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::array::{Label, NamedArray};
use crate::error::{CepError, CepResult};
use crate::variables::{VariableKind, VariableName};

/// How storage levels are coupled across time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Storage technologies are left out of the model.
    #[default]
    None,
    /// Each representative period is cyclic on its own.
    Intraperiod,
    /// Levels are additionally carried along the chronological period sequence.
    Interperiod,
}

impl StorageMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, StorageMode::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::None => "none",
            StorageMode::Intraperiod => "intraperiod",
            StorageMode::Interperiod => "interperiod",
        }
    }
}

/// Solved design variables from a previous run, pinned in a dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedDesign {
    pub values: BTreeMap<VariableName, NamedArray<f64>>,
}

impl FixedDesign {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a design collection. Non-design collections are rejected.
    pub fn insert(&mut self, name: VariableName, values: NamedArray<f64>) -> CepResult<()> {
        if name.kind() != VariableKind::Design {
            return Err(CepError::InvalidConfiguration(format!(
                "{} is not a design variable and cannot be fixed",
                name
            )));
        }
        self.values.insert(name, values);
        Ok(())
    }

    pub fn get(&self, name: VariableName) -> Option<&NamedArray<f64>> {
        self.values.get(&name)
    }

    /// Multiply every entry by the factor of its technology. Technologies
    /// without a factor keep their value.
    pub fn scaled(mut self, capacity_factors: &BTreeMap<String, f64>) -> CepResult<Self> {
        if capacity_factors.is_empty() {
            return Ok(self);
        }
        for array in self.values.values_mut() {
            let tech_pos = array
                .axis_names()
                .iter()
                .position(|a| *a == "tech")
                .ok_or_else(|| CepError::AxisMismatch("design array has no 'tech' axis".into()))?;
            let scaled = NamedArray::new(
                array.axes().to_vec(),
                array
                    .indexed_iter()
                    .map(|(key, v)| {
                        let factor = match key[tech_pos] {
                            Label::Str(tech) => capacity_factors.get(tech).copied(),
                            Label::Int(_) => None,
                        };
                        v * factor.unwrap_or(1.0)
                    })
                    .collect(),
            )?;
            *array = scaled;
        }
        Ok(self)
    }
}

/// Toggles for one assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Free-text label carried into the result.
    pub descriptor: String,
    /// Specific emission limit per unit of delivered energy (e.g. kg/MWh);
    /// `None` declares no budget.
    pub emission_limit: Option<f64>,
    /// Impact category the emission limit applies to.
    pub emission_category: String,
    /// Count installed capacity from the node and line tables; off by
    /// default, so every unit is built new.
    pub include_existing_infrastructure: bool,
    pub storage_mode: StorageMode,
    pub allow_transmission: bool,
    /// Couple line flows to nodal voltage angles (requires transmission).
    pub dc_power_flow: bool,
    /// Price per MWh of unserved demand; `None` forbids lost load.
    pub lost_load_price: Option<f64>,
    /// Price per unit of emission above the budget; `None` forbids it.
    pub lost_emission_price: Option<f64>,
    /// Cost year; `None` picks the first year of the cost table.
    pub year: Option<i64>,
    pub fixed_design_variables: Option<FixedDesign>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            descriptor: "cep".to_string(),
            emission_limit: None,
            emission_category: "CO2".to_string(),
            include_existing_infrastructure: false,
            storage_mode: StorageMode::None,
            allow_transmission: false,
            dc_power_flow: false,
            lost_load_price: None,
            lost_emission_price: None,
            year: None,
            fixed_design_variables: None,
        }
    }
}

impl ModelConfig {
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    pub fn with_emission_limit(mut self, limit: f64) -> Self {
        self.emission_limit = Some(limit);
        self
    }

    pub fn with_emission_category(mut self, category: impl Into<String>) -> Self {
        self.emission_category = category.into();
        self
    }

    pub fn with_existing_infrastructure(mut self, include: bool) -> Self {
        self.include_existing_infrastructure = include;
        self
    }

    pub fn with_storage(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    pub fn with_transmission(mut self, allow: bool) -> Self {
        self.allow_transmission = allow;
        self
    }

    pub fn with_dc_power_flow(mut self, enabled: bool) -> Self {
        self.dc_power_flow = enabled;
        self
    }

    pub fn with_lost_load_price(mut self, price: f64) -> Self {
        self.lost_load_price = Some(price);
        self
    }

    pub fn with_lost_emission_price(mut self, price: f64) -> Self {
        self.lost_emission_price = Some(price);
        self
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_fixed_design(mut self, design: FixedDesign) -> Self {
        self.fixed_design_variables = Some(design);
        self
    }

    /// Second-stage configuration: same toggles, design pinned, new slack prices.
    pub fn for_dispatch(
        &self,
        design: FixedDesign,
        lost_load_price: Option<f64>,
        lost_emission_price: Option<f64>,
    ) -> Self {
        Self {
            descriptor: format!("{}-dispatch", self.descriptor),
            lost_load_price,
            lost_emission_price,
            fixed_design_variables: Some(design),
            ..self.clone()
        }
    }

    /// Check toggles that contradict each other regardless of input data.
    pub fn validate(&self) -> CepResult<()> {
        if self.dc_power_flow && !self.allow_transmission {
            return Err(CepError::InvalidConfiguration(
                "dc_power_flow requires allow_transmission".into(),
            ));
        }
        for (name, price) in [
            ("lost_load_price", self.lost_load_price),
            ("lost_emission_price", self.lost_emission_price),
            ("emission_limit", self.emission_limit),
        ] {
            if let Some(value) = price {
                if !(value >= 0.0) || value.is_infinite() {
                    return Err(CepError::InvalidConfiguration(format!(
                        "{} must be a finite non-negative number, got {}",
                        name, value
                    )));
                }
            }
        }
        if self.emission_category.is_empty() {
            return Err(CepError::InvalidConfiguration(
                "emission_category must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> CepResult<Self> {
        let config: ModelConfig = toml::from_str(text)
            .map_err(|e| CepError::InvalidConfiguration(format!("parsing config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> CepResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            CepError::InvalidConfiguration(format!("reading '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Axis;

    #[test]
    fn toml_fills_defaults() {
        let config = ModelConfig::from_toml_str(
            r#"
            descriptor = "co2-cap"
            emission_limit = 50.0
            storage_mode = "interperiod"
            lost_load_price = 10000.0
            "#,
        )
        .unwrap();
        assert_eq!(config.descriptor, "co2-cap");
        assert_eq!(config.emission_limit, Some(50.0));
        assert_eq!(config.storage_mode, StorageMode::Interperiod);
        assert_eq!(config.lost_emission_price, None);
        assert!(!config.include_existing_infrastructure);
        assert_eq!(config.emission_category, "CO2");
    }

    #[test]
    fn unknown_fields_and_contradictions_are_rejected() {
        assert!(ModelConfig::from_toml_str("storage = true").is_err());
        let err = ModelConfig::from_toml_str("dc_power_flow = true").unwrap_err();
        assert!(matches!(err, CepError::InvalidConfiguration(_)));
        let err = ModelConfig::from_toml_str("lost_load_price = -1.0").unwrap_err();
        assert!(matches!(err, CepError::InvalidConfiguration(_)));
    }

    #[test]
    fn dispatch_config_pins_design_and_keeps_toggles() {
        let base = ModelConfig::default()
            .with_descriptor("design")
            .with_storage(StorageMode::Intraperiod)
            .with_emission_limit(100.0);
        let dispatch = base.for_dispatch(FixedDesign::new(), Some(1e4), None);
        assert_eq!(dispatch.descriptor, "design-dispatch");
        assert_eq!(dispatch.storage_mode, StorageMode::Intraperiod);
        assert_eq!(dispatch.emission_limit, Some(100.0));
        assert_eq!(dispatch.lost_load_price, Some(1e4));
        assert!(dispatch.fixed_design_variables.is_some());
        assert!(base.fixed_design_variables.is_none());
    }

    #[test]
    fn fixed_design_scales_by_technology() {
        let axes = vec![
            Axis::new("tech", ["pv", "gas"]).unwrap(),
            Axis::new("infrastruct", ["ex", "new"]).unwrap(),
        ];
        let cap = NamedArray::new(axes, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut design = FixedDesign::new();
        design.insert(VariableName::Cap, cap).unwrap();
        assert!(design
            .insert(VariableName::Gen, NamedArray::zeros(vec![]).unwrap())
            .is_err());

        let factors = BTreeMap::from([("pv".to_string(), 0.5)]);
        let scaled = design.scaled(&factors).unwrap();
        let cap = scaled.get(VariableName::Cap).unwrap();
        assert_eq!(cap.values(), &[0.5, 1.0, 3.0, 4.0]);
    }
}
