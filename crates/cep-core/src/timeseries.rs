//! Output of an external time-series aggregation
//!
//! Representative periods `k` with weights, `T` steps per period and one
//! `[k][t]` value matrix per series key. Demand of sector `s` at node `n` is
//! the series `"{s}_demand-{n}"`; availability of a technology with series key
//! `x` at node `n` is `"{x}-{n}"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CepError, CepResult};

fn default_delta_t() -> f64 {
    1.0
}

pub fn demand_key(sector: &str, node: &str) -> String {
    format!("{}_demand-{}", sector, node)
}

pub fn availability_key(series: &str, node: &str) -> String {
    format!("{}-{}", series, node)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredTimeSeries {
    /// Number of original periods represented by each representative period.
    pub weights: Vec<f64>,
    pub steps_per_period: usize,
    /// Hours per time step.
    #[serde(default = "default_delta_t")]
    pub delta_t: f64,
    pub series: BTreeMap<String, Vec<Vec<f64>>>,
    /// Chronological mapping of original periods to representative periods.
    #[serde(default)]
    pub period_sequence: Option<Vec<usize>>,
}

impl ClusteredTimeSeries {
    pub fn new(weights: Vec<f64>, steps_per_period: usize) -> Self {
        Self {
            weights,
            steps_per_period,
            delta_t: default_delta_t(),
            series: BTreeMap::new(),
            period_sequence: None,
        }
    }

    pub fn with_series(mut self, key: impl Into<String>, values: Vec<Vec<f64>>) -> Self {
        self.series.insert(key.into(), values);
        self
    }

    /// Same value at every step of every period.
    pub fn with_flat_series(self, key: impl Into<String>, value: f64) -> Self {
        let values = vec![vec![value; self.steps_per_period]; self.weights.len()];
        self.with_series(key, values)
    }

    pub fn with_delta_t(mut self, hours: f64) -> Self {
        self.delta_t = hours;
        self
    }

    pub fn with_period_sequence(mut self, sequence: Vec<usize>) -> Self {
        self.period_sequence = Some(sequence);
        self
    }

    pub fn period_count(&self) -> usize {
        self.weights.len()
    }

    /// The chronological period sequence, expanded from the weights when the
    /// aggregation did not supply one: each `k` repeated `round(w_k)` times,
    /// and at least once.
    pub fn sequence(&self) -> Vec<usize> {
        match &self.period_sequence {
            Some(seq) => seq.clone(),
            None => self
                .weights
                .iter()
                .enumerate()
                .flat_map(|(k, w)| std::iter::repeat(k).take(w.round().max(1.0) as usize))
                .collect(),
        }
    }

    pub fn has_series(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    pub fn series(&self, key: &str) -> CepResult<&[Vec<f64>]> {
        self.series
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| CepError::MissingData(format!("time series '{}' not provided", key)))
    }

    /// Value at zero-based period `k` and step `t`.
    pub fn value(&self, key: &str, k: usize, t: usize) -> CepResult<f64> {
        self.series(key)?
            .get(k)
            .and_then(|row| row.get(t))
            .copied()
            .ok_or_else(|| {
                CepError::MissingData(format!(
                    "time series '{}' has no value at period {} step {}",
                    key,
                    k + 1,
                    t + 1
                ))
            })
    }

    /// Weighted energy of a series over the represented horizon.
    pub fn weighted_sum(&self, key: &str) -> CepResult<f64> {
        let rows = self.series(key)?;
        Ok(rows
            .iter()
            .zip(&self.weights)
            .map(|(row, w)| w * self.delta_t * row.iter().sum::<f64>())
            .sum())
    }

    pub fn validate(&self) -> CepResult<()> {
        if self.weights.is_empty() || self.steps_per_period == 0 {
            return Err(CepError::MissingData(
                "time-series aggregation has no periods or no time steps".into(),
            ));
        }
        if let Some(w) = self.weights.iter().find(|w| !(**w > 0.0)) {
            return Err(CepError::InvalidData(format!(
                "period weight {} is not positive",
                w
            )));
        }
        if !(self.delta_t > 0.0) {
            return Err(CepError::InvalidData("delta_t must be positive".into()));
        }
        for (key, rows) in &self.series {
            let ragged = rows.len() != self.weights.len()
                || rows.iter().any(|r| r.len() != self.steps_per_period);
            if ragged {
                return Err(CepError::InvalidData(format!(
                    "time series '{}' is not {} periods x {} steps",
                    key,
                    self.weights.len(),
                    self.steps_per_period
                )));
            }
        }
        if let Some(seq) = &self.period_sequence {
            if seq.is_empty() {
                return Err(CepError::InvalidData("period sequence is empty".into()));
            }
            if let Some(k) = seq.iter().find(|k| **k >= self.weights.len()) {
                return Err(CepError::InvalidData(format!(
                    "period sequence refers to unknown period {}",
                    k + 1
                )));
            }
            // a period left out of the chronology would have an unconstrained storage cycle
            if let Some(k) = (0..self.weights.len()).find(|k| !seq.contains(k)) {
                return Err(CepError::InvalidData(format!(
                    "period sequence never visits representative period {}",
                    k + 1
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_expands_weights() {
        let ts = ClusteredTimeSeries::new(vec![2.0, 1.0, 3.0], 4);
        assert_eq!(ts.sequence(), vec![0, 0, 1, 2, 2, 2]);

        let explicit = ts.clone().with_period_sequence(vec![2, 0, 1, 2]);
        assert_eq!(explicit.sequence(), vec![2, 0, 1, 2]);
    }

    #[test]
    fn keys_follow_series_naming() {
        assert_eq!(demand_key("el", "germany"), "el_demand-germany");
        assert_eq!(availability_key("solar", "germany"), "solar-germany");
    }

    #[test]
    fn missing_and_ragged_series_are_reported() {
        let ts = ClusteredTimeSeries::new(vec![1.0], 3).with_series("el_demand-n1", vec![vec![1.0, 2.0]]);
        assert!(matches!(ts.validate(), Err(CepError::InvalidData(_))));
        assert!(matches!(ts.series("solar-n1"), Err(CepError::MissingData(_))));
    }

    #[test]
    fn sequence_must_visit_every_period() {
        let ts = ClusteredTimeSeries::new(vec![1.0, 1.0], 2).with_period_sequence(vec![0, 0]);
        let err = ts.validate().unwrap_err();
        assert!(err.to_string().contains("representative period 2"));

        let covered = ts.with_period_sequence(vec![1, 0, 0]);
        assert!(covered.validate().is_ok());
    }

    #[test]
    fn expanded_sequence_keeps_light_periods() {
        // weights below one half still appear once
        let ts = ClusteredTimeSeries::new(vec![0.3, 2.0], 1);
        assert_eq!(ts.sequence(), vec![0, 1, 1]);
        assert!(ts.validate().is_ok());
    }

    #[test]
    fn weighted_sum_uses_weights_and_step_length() {
        let ts = ClusteredTimeSeries::new(vec![2.0, 3.0], 2)
            .with_delta_t(0.5)
            .with_series("d", vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
        assert!(ts.validate().is_ok());
        // 2*0.5*2 + 3*0.5*4
        assert!((ts.weighted_sum("d").unwrap() - 8.0).abs() < 1e-12);
    }
}
