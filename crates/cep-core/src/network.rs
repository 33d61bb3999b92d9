//! Node and line records

use serde::{Deserialize, Serialize};

use crate::error::{CepError, CepResult};

/// Installed capacity and expansion limit of one technology at one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Existing installed capacity (MW, or MWh for storage reservoirs).
    pub power_ex: f64,
    /// Upper bound on existing + new capacity; `None` is unbounded.
    pub power_lim: Option<f64>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub region: String,
}

impl NodeData {
    pub fn new(power_ex: f64, power_lim: Option<f64>) -> Self {
        Self {
            power_ex,
            power_lim,
            lat: 0.0,
            lon: 0.0,
            region: String::new(),
        }
    }

    /// Technology not available at this node: nothing built, nothing buildable.
    pub fn not_applicable() -> Self {
        Self::new(0.0, Some(0.0))
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn validate(&self, tech: &str, node: &str) -> CepResult<()> {
        if self.power_ex < 0.0 {
            return Err(CepError::InvalidData(format!(
                "negative existing capacity for '{}' at '{}'",
                tech, node
            )));
        }
        if let Some(lim) = self.power_lim {
            if self.power_ex > lim {
                return Err(CepError::InvalidData(format!(
                    "existing capacity {} exceeds limit {} for '{}' at '{}'",
                    self.power_ex, lim, tech, node
                )));
            }
        }
        Ok(())
    }
}

impl Default for NodeData {
    fn default() -> Self {
        Self::not_applicable()
    }
}

/// A transmission corridor between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub name: String,
    /// Transmission technology carrying this line's costs and efficiency.
    pub tech: String,
    pub node_start: String,
    pub node_end: String,
    /// Series reactance, used by the DC power-flow coupling.
    pub reactance: f64,
    pub resistance: f64,
    pub power_ex: f64,
    pub power_lim: Option<f64>,
    pub circuits: u32,
    /// Voltage level in kV.
    pub voltage: f64,
    /// Length in km; transmission cost coefficients are per MW and km.
    pub length: f64,
}

impl LineData {
    pub fn new(
        name: impl Into<String>,
        tech: impl Into<String>,
        node_start: impl Into<String>,
        node_end: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            tech: tech.into(),
            node_start: node_start.into(),
            node_end: node_end.into(),
            reactance: 0.0,
            resistance: 0.0,
            power_ex: 0.0,
            power_lim: None,
            circuits: 1,
            voltage: 380.0,
            length: 1.0,
        }
    }

    pub fn with_capacity(mut self, power_ex: f64, power_lim: Option<f64>) -> Self {
        self.power_ex = power_ex;
        self.power_lim = power_lim;
        self
    }

    pub fn with_impedance(mut self, reactance: f64, resistance: f64) -> Self {
        self.reactance = reactance;
        self.resistance = resistance;
        self
    }

    pub fn with_length(mut self, km: f64) -> Self {
        self.length = km;
        self
    }

    pub fn with_circuits(mut self, circuits: u32, voltage: f64) -> Self {
        self.circuits = circuits;
        self.voltage = voltage;
        self
    }

    /// Check the record against the node set it must connect.
    pub fn validate<'a>(&self, nodes: impl Iterator<Item = &'a str> + Clone) -> CepResult<()> {
        if self.node_start == self.node_end {
            return Err(CepError::InvalidData(format!(
                "line '{}' starts and ends at '{}'",
                self.name, self.node_start
            )));
        }
        for endpoint in [&self.node_start, &self.node_end] {
            if !nodes.clone().any(|n| n == endpoint.as_str()) {
                return Err(CepError::InvalidData(format!(
                    "line '{}' references unknown node '{}'",
                    self.name, endpoint
                )));
            }
        }
        if let Some(lim) = self.power_lim {
            if self.power_ex > lim {
                return Err(CepError::InvalidData(format!(
                    "line '{}' existing capacity {} exceeds limit {}",
                    self.name, self.power_ex, lim
                )));
            }
        }
        if self.length <= 0.0 {
            return Err(CepError::InvalidData(format!(
                "line '{}' needs a positive length",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_above_limit_is_invalid() {
        assert!(NodeData::new(50.0, Some(100.0)).validate("pv", "n1").is_ok());
        assert!(NodeData::new(50.0, None).validate("pv", "n1").is_ok());
        assert!(matches!(
            NodeData::new(150.0, Some(100.0)).validate("pv", "n1"),
            Err(CepError::InvalidData(_))
        ));
    }

    #[test]
    fn line_endpoints_are_checked() {
        let nodes = ["north", "south"];
        let ok = LineData::new("l1", "ac", "north", "south");
        assert!(ok.validate(nodes.iter().copied()).is_ok());

        let self_loop = LineData::new("l2", "ac", "north", "north");
        assert!(self_loop.validate(nodes.iter().copied()).is_err());

        let dangling = LineData::new("l3", "ac", "north", "east");
        assert!(dangling.validate(nodes.iter().copied()).is_err());
    }
}
