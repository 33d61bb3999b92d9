//! Cost accounts and impact categories

use serde::{Deserialize, Serialize};

use crate::array::Label;

/// Axis names of the cost table, in storage order.
pub const COST_AXES: [&str; 5] = ["tech", "node", "year", "account", "impact"];

/// Cost component. Capital costs are annualized, fixed costs are per unit of
/// capacity and year, variable costs are per unit of energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Account {
    #[serde(rename = "cap")]
    Capital,
    #[serde(rename = "fix")]
    Fixed,
    #[serde(rename = "var")]
    Variable,
}

impl Account {
    pub const ALL: [Account; 3] = [Account::Capital, Account::Fixed, Account::Variable];

    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Capital => "cap",
            Account::Fixed => "fix",
            Account::Variable => "var",
        }
    }

    pub fn from_label(label: &Label) -> Option<Account> {
        match label.as_str()? {
            "cap" => Some(Account::Capital),
            "fix" => Some(Account::Fixed),
            "var" => Some(Account::Variable),
            _ => None,
        }
    }
}

impl From<Account> for Label {
    fn from(account: Account) -> Self {
        Label::from(account.as_str())
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Impact categories split into the monetary one and emission categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactCategories {
    pub monetary: String,
    pub emissions: Vec<String>,
}

impl ImpactCategories {
    pub fn is_monetary(&self, impact: &str) -> bool {
        self.monetary == impact
    }

    /// All impact labels, monetary first.
    pub fn all(&self) -> Vec<String> {
        std::iter::once(self.monetary.clone())
            .chain(self.emissions.iter().cloned())
            .collect()
    }
}
