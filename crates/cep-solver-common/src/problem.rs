//! Problem representation handed to solve backends.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Type of optimization problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    /// Linear Program
    Lp,
    /// Mixed-Integer Program
    Mip,
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemType::Lp => write!(f, "LP"),
            ProblemType::Mip => write!(f, "MIP"),
        }
    }
}

/// Index of a variable inside its [`LpProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: String,
    /// `None` is unbounded below.
    pub lower: Option<f64>,
    /// `None` is unbounded above.
    pub upper: Option<f64>,
    pub integer: bool,
}

impl VariableDef {
    pub fn continuous(name: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            integer: false,
        }
    }

    pub fn non_negative(name: impl Into<String>) -> Self {
        Self::continuous(name, Some(0.0), None)
    }

    pub fn free(name: impl Into<String>) -> Self {
        Self::continuous(name, None, None)
    }
}

/// Sparse affine expression `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Merge repeated variables and drop zero coefficients, keeping first-seen order.
    pub fn compact(&self) -> LinearExpr {
        let mut order: Vec<VarId> = Vec::new();
        let mut coefs: BTreeMap<VarId, f64> = BTreeMap::new();
        for (var, coef) in &self.terms {
            let entry = coefs.entry(*var).or_insert_with(|| {
                order.push(*var);
                0.0
            });
            *entry += coef;
        }
        LinearExpr {
            terms: order
                .into_iter()
                .filter_map(|v| {
                    let c = coefs[&v];
                    (c != 0.0).then_some((v, c))
                })
                .collect(),
            constant: self.constant,
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl From<f64> for LinearExpr {
    fn from(value: f64) -> Self {
        LinearExpr::constant(value)
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl SubAssign for LinearExpr {
    fn sub_assign(&mut self, rhs: LinearExpr) {
        self.terms
            .extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: LinearExpr) -> LinearExpr {
        self -= rhs;
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, rhs: f64) -> LinearExpr {
        for (_, c) in &mut self.terms {
            *c *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Eq => write!(f, "=="),
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
        }
    }
}

/// `expr (sense) rhs`, tagged with the family it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub family: String,
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Amount by which `values` violate this constraint (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Eq => (lhs - self.rhs).abs(),
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
        }
    }
}

/// Minimisation problem in solver-neutral form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LpProblem {
    pub name: String,
    pub variables: Vec<VariableDef>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: LinearExpr,
}

impl LpProblem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_variable(&mut self, def: VariableDef) -> VarId {
        self.variables.push(def);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(
        &mut self,
        family: &str,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            family: family.to_string(),
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn problem_type(&self) -> ProblemType {
        if self.variables.iter().any(|v| v.integer) {
            ProblemType::Mip
        } else {
            ProblemType::Lp
        }
    }

    /// Number of constraints per family, in family name order.
    pub fn family_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.family.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn constraints_in<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a LinearConstraint> {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Largest constraint or bound violation of a candidate point.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let bounds = self.variables.iter().enumerate().map(|(i, def)| {
            let x = values.get(i).copied().unwrap_or(0.0);
            let below = def.lower.map_or(0.0, |lo| (lo - x).max(0.0));
            let above = def.upper.map_or(0.0, |hi| (x - hi).max(0.0));
            below.max(above)
        });
        self.constraints
            .iter()
            .map(|c| c.violation(values))
            .chain(bounds)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_arithmetic_and_compaction() {
        let x = VarId(0);
        let y = VarId(1);
        let e = (LinearExpr::from(x) * 2.0 + LinearExpr::term(y, 3.0)) - LinearExpr::term(x, 2.0)
            + LinearExpr::constant(1.5);
        let c = e.compact();
        assert_eq!(c.terms, vec![(y, 3.0)]);
        assert_eq!(c.constant, 1.5);
        assert_eq!(e.evaluate(&[10.0, 1.0]), 4.5);
    }

    #[test]
    fn violation_respects_sense() {
        let mut lp = LpProblem::new("t");
        let x = lp.add_variable(VariableDef::continuous("x", Some(0.0), Some(5.0)));
        lp.add_constraint("cap", "x<=3", LinearExpr::from(x), Sense::Le, 3.0);
        lp.add_constraint("bal", "x==2", LinearExpr::from(x), Sense::Eq, 2.0);
        assert_eq!(lp.max_violation(&[2.0]), 0.0);
        assert_eq!(lp.max_violation(&[4.0]), 2.0);
        assert_eq!(lp.max_violation(&[6.0]), 4.0);
        assert_eq!(lp.family_counts().get("cap"), Some(&1));
        assert_eq!(lp.problem_type(), ProblemType::Lp);
    }
}
