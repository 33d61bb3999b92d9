//! Immutable input data model
//!
//! [`InputData`] bundles the technology, node, line and cost tables, each
//! keyed by a [`NamedArray`]. It is built once through [`InputDataBuilder`],
//! which validates every record, and is never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::array::{Axis, Label, NamedArray};
use crate::costs::{Account, ImpactCategories, COST_AXES};
use crate::error::{CepError, CepResult};
use crate::network::{LineData, NodeData};
use crate::tech::{StoragePart, TechCategory, Technology};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    region: String,
    currency: String,
    techs: NamedArray<Technology>,
    nodes: NamedArray<NodeData>,
    lines: NamedArray<LineData>,
    costs: NamedArray<f64>,
}

impl InputData {
    pub fn builder(currency: impl Into<String>) -> InputDataBuilder {
        InputDataBuilder::new(currency)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Monetary impact label of the cost table, e.g. "EUR".
    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn techs(&self) -> &NamedArray<Technology> {
        &self.techs
    }

    /// Technologies in declaration order.
    pub fn technologies(&self) -> impl Iterator<Item = &Technology> {
        self.techs.values().iter()
    }

    pub fn tech(&self, name: &str) -> CepResult<&Technology> {
        self.techs.get(&[Label::from(name)])
    }

    pub fn nodes(&self) -> &NamedArray<NodeData> {
        &self.nodes
    }

    pub fn node_labels(&self) -> &[Label] {
        // "node" is always the second axis of the node table
        self.nodes.axes()[1].labels()
    }

    pub fn node(&self, tech: &str, node: &str) -> CepResult<&NodeData> {
        self.nodes.get(&[Label::from(tech), Label::from(node)])
    }

    pub fn lines(&self) -> &NamedArray<LineData> {
        &self.lines
    }

    pub fn line(&self, name: &str) -> CepResult<&LineData> {
        self.lines.get(&[Label::from(name)])
    }

    pub fn costs(&self) -> &NamedArray<f64> {
        &self.costs
    }

    pub fn cost(
        &self,
        tech: &str,
        node: &str,
        year: i64,
        account: Account,
        impact: &str,
    ) -> CepResult<f64> {
        self.costs
            .get(&[
                Label::from(tech),
                Label::from(node),
                Label::from(year),
                Label::from(account),
                Label::from(impact),
            ])
            .copied()
    }

    /// Years observed in the cost table, ascending.
    pub fn years(&self) -> &[Label] {
        self.costs.axes()[2].labels()
    }

    /// Impact categories observed in the cost table, monetary first.
    pub fn impacts(&self) -> ImpactCategories {
        ImpactCategories {
            monetary: self.currency.clone(),
            emissions: self.costs.axes()[4]
                .labels()
                .iter()
                .map(ToString::to_string)
                .filter(|i| *i != self.currency)
                .collect(),
        }
    }
}

struct CostEntry {
    tech: String,
    node: String,
    year: i64,
    account: Account,
    impact: String,
    value: f64,
}

/// Collects records and validates them into an [`InputData`].
///
/// # Example
///
/// ```
/// use cep_core::{Account, InputDataBuilder, NodeData, Technology};
///
/// let data = InputDataBuilder::new("EUR")
///     .tech(Technology::generation("gas", "el"))
///     .node("n1")
///     .node_data("gas", "n1", NodeData::new(0.0, Some(100.0)))
///     .cost("gas", "n1", 2030, Account::Capital, "EUR", 800.0)
///     .build()?;
/// assert_eq!(data.cost("gas", "n1", 2030, Account::Capital, "EUR")?, 800.0);
/// # Ok::<(), cep_core::CepError>(())
/// ```
pub struct InputDataBuilder {
    region: String,
    currency: String,
    techs: Vec<Technology>,
    node_names: Vec<String>,
    node_data: Vec<(String, String, NodeData)>,
    lines: Vec<LineData>,
    costs: Vec<CostEntry>,
}

impl InputDataBuilder {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            region: String::new(),
            currency: currency.into(),
            techs: Vec::new(),
            node_names: Vec::new(),
            node_data: Vec::new(),
            lines: Vec::new(),
            costs: Vec::new(),
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn tech(mut self, tech: Technology) -> Self {
        self.techs.push(tech);
        self
    }

    pub fn techs(mut self, techs: impl IntoIterator<Item = Technology>) -> Self {
        self.techs.extend(techs);
        self
    }

    /// Declare a node. Declaration order is the node axis order.
    pub fn node(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.node_names.contains(&name) {
            self.node_names.push(name);
        }
        self
    }

    /// Capacity data of `tech` at `node`. Pairs never supplied are treated as
    /// not applicable (nothing existing, nothing buildable).
    pub fn node_data(
        mut self,
        tech: impl Into<String>,
        node: impl Into<String>,
        data: NodeData,
    ) -> Self {
        self.node_data.push((tech.into(), node.into(), data));
        self
    }

    pub fn line(mut self, line: LineData) -> Self {
        self.lines.push(line);
        self
    }

    pub fn cost(
        mut self,
        tech: impl Into<String>,
        node: impl Into<String>,
        year: i64,
        account: Account,
        impact: impl Into<String>,
        value: f64,
    ) -> Self {
        self.costs.push(CostEntry {
            tech: tech.into(),
            node: node.into(),
            year,
            account,
            impact: impact.into(),
            value,
        });
        self
    }

    pub fn build(self) -> CepResult<InputData> {
        for tech in &self.techs {
            tech.validate()?;
        }
        let tech_axis = Axis::new("tech", self.techs.iter().map(|t| t.name.clone()))?;
        let node_axis = Axis::new("node", self.node_names.iter().cloned())?;

        for tech in &self.techs {
            if let Some(unit) = &tech.storage_unit {
                let reservoir = self.techs.iter().find(|t| &t.name == unit).ok_or_else(|| {
                    CepError::MissingData(format!(
                        "storage technology '{}' refers to unknown reservoir '{}'",
                        tech.name, unit
                    ))
                })?;
                if reservoir.category != TechCategory::Storage(StoragePart::Energy) {
                    return Err(CepError::InvalidData(format!(
                        "'{}' is not a storage reservoir (referenced by '{}')",
                        unit, tech.name
                    )));
                }
            }
        }

        let techs = NamedArray::new(vec![tech_axis.clone()], self.techs.clone())?;

        let mut nodes =
            NamedArray::filled(vec![tech_axis.clone(), node_axis.clone()], NodeData::default())?;
        for (tech, node, data) in self.node_data {
            data.validate(&tech, &node)?;
            nodes.set(&[Label::from(tech), Label::from(node)], data)?;
        }

        let line_axis = Axis::new("line", self.lines.iter().map(|l| l.name.clone()))?;
        for line in &self.lines {
            line.validate(self.node_names.iter().map(String::as_str))?;
            let tech = self.techs.iter().find(|t| t.name == line.tech).ok_or_else(|| {
                CepError::MissingData(format!(
                    "line '{}' uses unknown technology '{}'",
                    line.name, line.tech
                ))
            })?;
            if !tech.category.is_transmission() {
                return Err(CepError::InvalidData(format!(
                    "line '{}' uses non-transmission technology '{}'",
                    line.name, line.tech
                )));
            }
        }
        let lines = NamedArray::new(vec![line_axis], self.lines)?;

        let mut years: Vec<i64> = self.costs.iter().map(|c| c.year).collect();
        years.sort_unstable();
        years.dedup();
        let mut impacts = vec![self.currency.clone()];
        for entry in &self.costs {
            if !impacts.contains(&entry.impact) {
                impacts.push(entry.impact.clone());
            }
        }
        let axes = vec![
            tech_axis,
            node_axis,
            Axis::new(COST_AXES[2], years)?,
            Axis::new(COST_AXES[3], Account::ALL)?,
            Axis::new(COST_AXES[4], impacts)?,
        ];
        let mut costs = NamedArray::zeros(axes)?;
        for entry in self.costs {
            costs.set(
                &[
                    Label::from(entry.tech),
                    Label::from(entry.node),
                    Label::from(entry.year),
                    Label::from(entry.account),
                    Label::from(entry.impact),
                ],
                entry.value,
            )?;
        }

        Ok(InputData {
            region: self.region,
            currency: self.currency,
            techs,
            nodes,
            lines,
            costs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> InputDataBuilder {
        InputDataBuilder::new("EUR")
            .region("test")
            .tech(Technology::generation("pv", "el").with_time_series("solar"))
            .tech(Technology::transmission("ac", "el"))
            .node("north")
            .node("south")
            .node_data("pv", "north", NodeData::new(10.0, Some(100.0)))
    }

    #[test]
    fn unspecified_node_data_is_not_applicable() {
        let data = builder().build().unwrap();
        assert_eq!(data.node("pv", "north").unwrap().power_lim, Some(100.0));
        let south = data.node("pv", "south").unwrap();
        assert_eq!(south.power_ex, 0.0);
        assert_eq!(south.power_lim, Some(0.0));
    }

    #[test]
    fn cost_axes_follow_observed_labels() {
        let data = builder()
            .cost("pv", "north", 2050, Account::Capital, "EUR", 500.0)
            .cost("pv", "north", 2030, Account::Capital, "EUR", 900.0)
            .cost("pv", "north", 2030, Account::Capital, "CO2", 40.0)
            .build()
            .unwrap();
        assert_eq!(data.years(), &[Label::Int(2030), Label::Int(2050)]);
        let impacts = data.impacts();
        assert_eq!(impacts.monetary, "EUR");
        assert_eq!(impacts.emissions, vec!["CO2".to_string()]);
        assert_eq!(
            data.cost("pv", "north", 2030, Account::Capital, "EUR").unwrap(),
            900.0
        );
        assert_eq!(
            data.cost("pv", "south", 2050, Account::Variable, "CO2").unwrap(),
            0.0
        );
    }

    #[test]
    fn cost_for_unknown_node_is_key_not_found() {
        let err = builder()
            .cost("pv", "east", 2030, Account::Fixed, "EUR", 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CepError::KeyNotFound { ref axis, .. } if axis == "node"));
    }

    #[test]
    fn existing_above_limit_is_rejected() {
        let err = builder()
            .node_data("pv", "south", NodeData::new(200.0, Some(100.0)))
            .build()
            .unwrap_err();
        assert!(matches!(err, CepError::InvalidData(_)));
    }

    #[test]
    fn lines_need_transmission_tech_and_known_nodes() {
        let ok = builder()
            .line(LineData::new("l1", "ac", "north", "south"))
            .build();
        assert!(ok.is_ok());

        let wrong_tech = builder()
            .line(LineData::new("l1", "pv", "north", "south"))
            .build();
        assert!(matches!(wrong_tech, Err(CepError::InvalidData(_))));

        let unknown_node = builder()
            .line(LineData::new("l1", "ac", "north", "west"))
            .build();
        assert!(matches!(unknown_node, Err(CepError::InvalidData(_))));
    }

    #[test]
    fn storage_parts_must_reference_a_reservoir() {
        let mut parts = Technology::storage_unit("bat", "el", 0.9, 0.9);
        parts[1].storage_unit = Some("pv".into());
        let err = builder().techs(parts).build().unwrap_err();
        assert!(matches!(err, CepError::InvalidData(_)));
    }
}
