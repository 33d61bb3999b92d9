//! TOML sweep documents.
//!
//! ```toml
//! name = "co2"
//! threads = 4
//! timeout_seconds = 600.0
//! backend = "clarabel"
//!
//! [base]
//! storage_mode = "intraperiod"
//! lost_load_price = 10000.0
//!
//! [[scenario]]
//! id = "free"
//!
//! [[scenario]]
//! id = "limit-100"
//! emission_limit = 100.0
//! lost_emission_price = 500.0
//!
//! [[scenario]]
//! id = "no-slack"
//! lost_load_price = "unbounded"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cep_algo::LpSolverKind;
use cep_core::ModelConfig;
use cep_solver_common::SolveOptions;
use serde::{Deserialize, Serialize};

use crate::job::SweepScenario;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSpec {
    pub name: String,
    /// Worker threads; 0 uses every core.
    pub threads: usize,
    /// Per-scenario wall-clock limit.
    pub timeout_seconds: Option<f64>,
    pub backend: LpSolverKind,
    pub base: ModelConfig,
    #[serde(rename = "scenario")]
    pub scenarios: Vec<SweepScenario>,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            name: "sweep".to_string(),
            threads: 0,
            timeout_seconds: None,
            backend: LpSolverKind::default(),
            base: ModelConfig::default(),
            scenarios: Vec::new(),
        }
    }
}

impl SweepSpec {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let spec: SweepSpec = toml::from_str(text).context("parsing sweep spec")?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading sweep spec '{}'", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in sweep spec '{}'", path.display()))
    }

    /// Reject empty or duplicate ids and configurations that cannot assemble.
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            bail!("sweep '{}' declares no scenarios", self.name);
        }
        if let Some(seconds) = self.timeout_seconds {
            if !(seconds > 0.0) || seconds.is_infinite() {
                bail!("timeout_seconds must be a positive number, got {}", seconds);
            }
        }
        self.base.validate().context("base configuration")?;

        let mut seen = BTreeSet::new();
        for scenario in &self.scenarios {
            if scenario.id.is_empty() {
                bail!("scenario without an id");
            }
            if !seen.insert(scenario.id.as_str()) {
                bail!("duplicate scenario id '{}'", scenario.id);
            }
            scenario
                .apply(&self.base)
                .validate()
                .with_context(|| format!("scenario '{}'", scenario.id))?;
        }
        Ok(())
    }

    pub fn solve_options(&self) -> SolveOptions {
        match self.timeout_seconds {
            Some(seconds) => SolveOptions::default().with_timeout(Duration::from_secs_f64(seconds)),
            None => SolveOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cep_core::StorageMode;

    const SPEC: &str = r#"
name = "co2"
threads = 2
timeout_seconds = 30.0
backend = "clarabel"

[base]
descriptor = "de"
storage_mode = "intraperiod"
lost_load_price = 10000.0

[[scenario]]
id = "free"

[[scenario]]
id = "tight"
emission_limit = 100.0
storage_mode = "interperiod"
"#;

    #[test]
    fn parses_base_and_scenarios() {
        let spec = SweepSpec::from_toml_str(SPEC).unwrap();
        assert_eq!(spec.name, "co2");
        assert_eq!(spec.threads, 2);
        assert_eq!(spec.backend, LpSolverKind::Clarabel);
        assert_eq!(spec.base.lost_load_price, Some(10_000.0));
        assert_eq!(spec.scenarios.len(), 2);
        assert_eq!(spec.scenarios[1].storage_mode, Some(StorageMode::Interperiod));
        assert_eq!(spec.solve_options().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let text = "[[scenario]]\nid = \"a\"\n\n[[scenario]]\nid = \"a\"\n";
        let err = SweepSpec::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("duplicate scenario id 'a'"));
    }

    #[test]
    fn rejects_unknown_fields_and_empty_sweeps() {
        assert!(SweepSpec::from_toml_str("[[scenario]]\nid = \"a\"\ncolour = 1\n").is_err());
        assert!(SweepSpec::from_toml_str("name = \"empty\"\n").is_err());
    }

    #[test]
    fn scenario_configs_are_validated() {
        let text = "[[scenario]]\nid = \"dc\"\ndc_power_flow = true\n";
        let err = SweepSpec::from_toml_str(text).unwrap_err();
        assert!(format!("{:#}", err).contains("scenario 'dc'"));
    }
}
