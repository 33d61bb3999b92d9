//! Decision variable collection names and their type tags

use serde::{Deserialize, Serialize};

/// Role of a variable collection in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Cost accounting variables summed by the objective.
    Cost,
    /// Investment decisions (capacities).
    Design,
    /// Dispatch decisions within the represented periods.
    Operating,
    /// Penalized relaxations.
    Slack,
}

/// Variable collections the assembler may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableName {
    /// `[account, impact, tech]`
    #[serde(rename = "COST")]
    Cost,
    /// `[tech, infrastruct, node]`
    #[serde(rename = "CAP")]
    Cap,
    /// `[sector, tech, t, k, node]`
    #[serde(rename = "GEN")]
    Gen,
    /// `[sector, tech, t_e, k, node]`
    #[serde(rename = "INTRASTOR")]
    IntraStor,
    /// `[sector, tech, i_e, node]`
    #[serde(rename = "INTERSTOR")]
    InterStor,
    /// `[sector, dir, tech, t, k, line]`
    #[serde(rename = "FLOW")]
    Flow,
    /// `[tech, infrastruct, line]`
    #[serde(rename = "TRANS")]
    Trans,
    /// `[sector, t, k, node]`
    #[serde(rename = "SLACK")]
    Slack,
    /// `[sector]`
    #[serde(rename = "LL")]
    LostLoad,
    /// `[impact]`
    #[serde(rename = "LE")]
    LostEmission,
    /// `[sector, t, k, node]`, voltage angles for DC power flow
    #[serde(rename = "THETA")]
    Theta,
}

impl VariableName {
    pub const ALL: [VariableName; 11] = [
        VariableName::Cost,
        VariableName::Cap,
        VariableName::Gen,
        VariableName::IntraStor,
        VariableName::InterStor,
        VariableName::Flow,
        VariableName::Trans,
        VariableName::Slack,
        VariableName::LostLoad,
        VariableName::LostEmission,
        VariableName::Theta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableName::Cost => "COST",
            VariableName::Cap => "CAP",
            VariableName::Gen => "GEN",
            VariableName::IntraStor => "INTRASTOR",
            VariableName::InterStor => "INTERSTOR",
            VariableName::Flow => "FLOW",
            VariableName::Trans => "TRANS",
            VariableName::Slack => "SLACK",
            VariableName::LostLoad => "LL",
            VariableName::LostEmission => "LE",
            VariableName::Theta => "THETA",
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            VariableName::Cost => VariableKind::Cost,
            VariableName::Cap | VariableName::Trans => VariableKind::Design,
            VariableName::Gen
            | VariableName::IntraStor
            | VariableName::InterStor
            | VariableName::Flow
            | VariableName::Theta => VariableKind::Operating,
            VariableName::Slack | VariableName::LostLoad | VariableName::LostEmission => {
                VariableKind::Slack
            }
        }
    }
}

impl std::fmt::Display for VariableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_variables_are_capacities() {
        let design: Vec<_> = VariableName::ALL
            .iter()
            .filter(|v| v.kind() == VariableKind::Design)
            .collect();
        assert_eq!(design, vec![&VariableName::Cap, &VariableName::Trans]);
    }
}
