use cep_core::{ModelConfig, StorageMode};
use serde::{Deserialize, Serialize};

use crate::spec::SweepSpec;

/// Override for a limit or price that the baseline may also leave open.
///
/// Written as a number, or as the string `"unbounded"` to lift a bound the
/// baseline sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundOverride {
    Value(f64),
    Keyword(BoundKeyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKeyword {
    Unbounded,
}

impl BoundOverride {
    pub const UNBOUNDED: Self = Self::Keyword(BoundKeyword::Unbounded);

    pub fn bound(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::Keyword(BoundKeyword::Unbounded) => None,
        }
    }
}

impl From<f64> for BoundOverride {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

/// One `[[scenario]]` table: the fields that differ from the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepScenario {
    pub id: String,
    /// Defaults to `<base descriptor>-<id>`.
    pub descriptor: Option<String>,
    pub emission_limit: Option<BoundOverride>,
    pub emission_category: Option<String>,
    pub storage_mode: Option<StorageMode>,
    pub allow_transmission: Option<bool>,
    pub dc_power_flow: Option<bool>,
    pub include_existing_infrastructure: Option<bool>,
    pub lost_load_price: Option<BoundOverride>,
    pub lost_emission_price: Option<BoundOverride>,
    pub year: Option<i64>,
}

impl SweepScenario {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Baseline with this scenario's overrides applied.
    pub fn apply(&self, base: &ModelConfig) -> ModelConfig {
        let mut config = base.clone();
        config.descriptor = self
            .descriptor
            .clone()
            .unwrap_or_else(|| format!("{}-{}", base.descriptor, self.id));
        if let Some(limit) = self.emission_limit {
            config.emission_limit = limit.bound();
        }
        if let Some(category) = &self.emission_category {
            config.emission_category = category.clone();
        }
        if let Some(mode) = self.storage_mode {
            config.storage_mode = mode;
        }
        if let Some(allow) = self.allow_transmission {
            config.allow_transmission = allow;
        }
        if let Some(dc) = self.dc_power_flow {
            config.dc_power_flow = dc;
        }
        if let Some(include) = self.include_existing_infrastructure {
            config.include_existing_infrastructure = include;
        }
        if let Some(price) = self.lost_load_price {
            config.lost_load_price = price.bound();
        }
        if let Some(price) = self.lost_emission_price {
            config.lost_emission_price = price.bound();
        }
        if let Some(year) = self.year {
            config.year = Some(year);
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct SweepJob {
    pub job_id: String,
    pub scenario_id: String,
    pub config: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepJobRecord {
    pub job_id: String,
    pub scenario_id: String,
    pub descriptor: String,
    /// `ok`, `infeasible`, `unbounded`, `timeout`, `cancelled` or `error`.
    pub status: String,
    pub objective: Option<f64>,
    pub diagnostic: Option<String>,
    pub error: Option<String>,
    pub solve_time_ms: Option<i64>,
    pub elapsed_ms: i64,
    pub output: Option<String>,
}

impl SweepJobRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// One job per scenario, in declaration order.
pub fn jobs_from_spec(spec: &SweepSpec) -> Vec<SweepJob> {
    spec.scenarios
        .iter()
        .map(|scenario| SweepJob {
            job_id: format!("{}:{}", spec.name, scenario.id),
            scenario_id: scenario.id.clone(),
            config: scenario.apply(&spec.base),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_overrides_only_named_fields() {
        let base = ModelConfig::default()
            .with_descriptor("base")
            .with_lost_load_price(5_000.0);
        let scenario = SweepScenario {
            emission_limit: Some(BoundOverride::Value(100.0)),
            storage_mode: Some(StorageMode::Interperiod),
            ..SweepScenario::new("tight")
        };

        let config = scenario.apply(&base);
        assert_eq!(config.descriptor, "base-tight");
        assert_eq!(config.emission_limit, Some(100.0));
        assert_eq!(config.storage_mode, StorageMode::Interperiod);
        assert_eq!(config.lost_load_price, Some(5_000.0));
        assert!(!config.allow_transmission);
    }

    #[test]
    fn unbounded_override_lifts_baseline_bounds() {
        let base = ModelConfig::default()
            .with_emission_limit(50.0)
            .with_lost_load_price(1_000.0)
            .with_lost_emission_price(200.0);
        let scenario: SweepScenario = toml::from_str(
            r#"
id = "open"
emission_limit = "unbounded"
lost_load_price = "unbounded"
lost_emission_price = 300.0
"#,
        )
        .unwrap();
        assert_eq!(scenario.emission_limit, Some(BoundOverride::UNBOUNDED));

        let config = scenario.apply(&base);
        assert_eq!(config.emission_limit, None);
        assert_eq!(config.lost_load_price, None);
        assert_eq!(config.lost_emission_price, Some(300.0));
    }

    #[test]
    fn unknown_bound_keyword_is_rejected() {
        let parsed: Result<SweepScenario, _> = toml::from_str(
            r#"
id = "bad"
lost_load_price = "infinite"
"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn explicit_descriptor_wins() {
        let scenario = SweepScenario {
            descriptor: Some("custom".into()),
            ..SweepScenario::new("s1")
        };
        assert_eq!(scenario.apply(&ModelConfig::default()).descriptor, "custom");
    }

    #[test]
    fn jobs_carry_the_sweep_name() {
        let spec = SweepSpec {
            name: "co2".into(),
            scenarios: vec![SweepScenario::new("a"), SweepScenario::new("b")],
            ..SweepSpec::default()
        };
        let jobs = jobs_from_spec(&spec);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_id, "co2:a");
        assert_eq!(jobs[1].config.descriptor, "cep-b");
    }
}
