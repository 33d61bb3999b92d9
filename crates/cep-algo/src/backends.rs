//! good_lp solve backends
//!
//! [`GoodLpBackend`] translates the solver-neutral [`LpProblem`] into a
//! good_lp model, solves it with the selected LP solver and maps the outcome
//! back onto [`LpSolution`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cep_core::CepError;
use cep_solver_common::{
    LinearExpr, LpProblem, LpSolution, ProblemType, Sense, SolutionStatus, SolveBackend,
    SolverError,
};
use good_lp::solvers::clarabel::clarabel;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::WithTimeLimit;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution,
    SolutionStatus as LpStatus, SolverModel, Variable,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// LP solvers compiled into this build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LpSolverKind {
    #[default]
    Clarabel,
    #[cfg(feature = "solver-highs")]
    Highs,
}

const AVAILABLE_LP_SOLVERS: &[&str] = &[
    "clarabel",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl LpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_LP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LpSolverKind::Clarabel => "clarabel",
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => "highs",
        }
    }

    pub fn backend(self) -> Arc<dyn SolveBackend> {
        Arc::new(GoodLpBackend::new(self))
    }
}

impl fmt::Display for LpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown_solver_error(label: &str) -> CepError {
    CepError::InvalidConfiguration(format!(
        "unknown lp solver '{}'; supported values: {}",
        label,
        LpSolverKind::available().join(", ")
    ))
}

impl FromStr for LpSolverKind {
    type Err = CepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "clarabel" => Ok(LpSolverKind::Clarabel),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(LpSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            other => Err(unknown_solver_error(other)),
        }
    }
}

/// [`SolveBackend`] over good_lp. Continuous problems only.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpBackend {
    kind: LpSolverKind,
}

impl GoodLpBackend {
    pub fn new(kind: LpSolverKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> LpSolverKind {
        self.kind
    }
}

fn to_expression(expr: &LinearExpr, columns: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant);
    for (var, coef) in &expr.terms {
        out += *coef * columns[var.index()];
    }
    out
}

/// Clarabel reports its own `time_limit` as this error.
const CLARABEL_TIME_LIMIT: ResolutionError = ResolutionError::Other("Time limit reached");

enum Outcome {
    Solved(Vec<f64>),
    TimeLimit,
}

fn solve_model<M>(
    mut model: M,
    problem: &LpProblem,
    columns: &[Variable],
) -> Result<Outcome, ResolutionError>
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in &problem.constraints {
        let lhs = to_expression(&row.expr, columns);
        let rhs = row.rhs;
        model = match row.sense {
            Sense::Eq => model.with(constraint!(lhs == rhs)),
            Sense::Le => model.with(constraint!(lhs <= rhs)),
            Sense::Ge => model.with(constraint!(lhs >= rhs)),
        };
    }
    let solution = model.solve()?;
    if matches!(solution.status(), LpStatus::TimeLimit) {
        return Ok(Outcome::TimeLimit);
    }
    Ok(Outcome::Solved(
        columns.iter().map(|v| solution.value(*v)).collect(),
    ))
}

impl SolveBackend for GoodLpBackend {
    fn id(&self) -> &str {
        self.kind.as_str()
    }

    fn supports(&self, problem_type: ProblemType) -> bool {
        problem_type == ProblemType::Lp
    }

    fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
        self.solve_within(problem, None)
    }

    fn solve_within(
        &self,
        problem: &LpProblem,
        time_limit: Option<Duration>,
    ) -> Result<LpSolution, SolverError> {
        let problem_type = problem.problem_type();
        if !self.supports(problem_type) {
            return Err(SolverError::Unsupported {
                backend: self.id().to_string(),
                problem_type,
            });
        }

        let start = Instant::now();
        let mut vars = variables!();
        let columns: Vec<Variable> = problem
            .variables
            .iter()
            .map(|def| {
                let mut column = variable();
                if let Some(lower) = def.lower {
                    column = column.min(lower);
                }
                if let Some(upper) = def.upper {
                    column = column.max(upper);
                }
                vars.add(column)
            })
            .collect();
        let unsolved = vars.minimise(to_expression(&problem.objective, &columns));
        debug!(
            solver = self.id(),
            problem = %problem.name,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            time_limit = ?time_limit,
            "handing problem to lp solver"
        );

        let outcome = match self.kind {
            LpSolverKind::Clarabel => {
                let mut model = unsolved.using(clarabel);
                if let Some(limit) = time_limit {
                    model.settings().time_limit(limit.as_secs_f64());
                }
                solve_model(model, problem, &columns)
            }
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => {
                let mut model = unsolved.using(highs);
                if let Some(limit) = time_limit {
                    model = model.with_time_limit(limit.as_secs_f64());
                }
                solve_model(model, problem, &columns)
            }
        };
        let elapsed = start.elapsed().as_millis() as i64;

        let solution = match outcome {
            Ok(Outcome::Solved(values)) => {
                let objective = problem.objective_value(&values);
                LpSolution::optimal(objective, values, elapsed)
            }
            Ok(Outcome::TimeLimit) => {
                LpSolution::terminated(SolutionStatus::Timeout, "solver time limit reached", elapsed)
            }
            Err(err) if err == CLARABEL_TIME_LIMIT => {
                LpSolution::terminated(SolutionStatus::Timeout, "solver time limit reached", elapsed)
            }
            Err(ResolutionError::Infeasible) => {
                LpSolution::terminated(SolutionStatus::Infeasible, "problem is infeasible", elapsed)
            }
            Err(ResolutionError::Unbounded) => {
                LpSolution::terminated(SolutionStatus::Unbounded, "problem is unbounded", elapsed)
            }
            Err(other) => {
                warn!(solver = self.id(), error = %other, "lp solver failed");
                LpSolution::terminated(SolutionStatus::Error, other.to_string(), elapsed)
            }
        };
        debug!(
            solver = self.id(),
            status = %solution.status,
            solve_time_ms = elapsed,
            "lp solver finished"
        );
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cep_solver_common::VariableDef;

    #[test]
    fn parses_solver_names_case_insensitively() {
        assert_eq!("Clarabel".parse::<LpSolverKind>().unwrap(), LpSolverKind::Clarabel);
        let err = "gurobi".parse::<LpSolverKind>().unwrap_err();
        assert!(err.to_string().contains("clarabel"));
        assert_eq!(LpSolverKind::default().as_str(), "clarabel");
    }

    #[test]
    fn solves_small_lp() {
        // min x + 2y  s.t.  x + y >= 4,  y >= 1
        let mut problem = LpProblem::new("small");
        let x = problem.add_variable(VariableDef::non_negative("x"));
        let y = problem.add_variable(VariableDef::continuous("y", Some(1.0), Some(10.0)));
        let mut row = LinearExpr::term(x, 1.0);
        row.add_term(y, 1.0);
        problem.add_constraint("demand", "demand[0]", row, Sense::Ge, 4.0);
        let mut objective = LinearExpr::term(x, 1.0);
        objective.add_term(y, 2.0);
        problem.objective = objective;

        let solution = GoodLpBackend::default().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective - 5.0).abs() < 1e-5);
        assert!((solution.value(x).unwrap() - 3.0).abs() < 1e-5);
        assert!(problem.max_violation(&solution.values) < 1e-6);
    }

    #[test]
    fn reports_infeasible_as_status() {
        let mut problem = LpProblem::new("infeasible");
        let x = problem.add_variable(VariableDef::non_negative("x"));
        problem.add_constraint("cap", "cap[0]", LinearExpr::term(x, 1.0), Sense::Le, -1.0);
        problem.objective = LinearExpr::term(x, 1.0);

        let solution = GoodLpBackend::default().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn generous_time_limit_still_solves() {
        let mut problem = LpProblem::new("limited");
        let x = problem.add_variable(VariableDef::continuous("x", Some(2.0), Some(10.0)));
        problem.objective = LinearExpr::term(x, 1.0);

        let solution = GoodLpBackend::default()
            .solve_within(&problem, Some(Duration::from_secs(60)))
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective - 2.0).abs() < 1e-5);
    }

    #[test]
    fn clarabel_time_limit_maps_to_timeout() {
        let mut problem = LpProblem::new("instant");
        let x = problem.add_variable(VariableDef::non_negative("x"));
        let y = problem.add_variable(VariableDef::non_negative("y"));
        let mut row = LinearExpr::term(x, 1.0);
        row.add_term(y, 1.0);
        problem.add_constraint("demand", "demand[0]", row, Sense::Ge, 4.0);
        problem.objective = LinearExpr::term(x, 1.0) + LinearExpr::term(y, 3.0);

        let solution = GoodLpBackend::default()
            .solve_within(&problem, Some(Duration::ZERO))
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Timeout);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn rejects_integer_problems() {
        let mut problem = LpProblem::new("mip");
        let mut def = VariableDef::non_negative("n");
        def.integer = true;
        problem.add_variable(def);
        let err = GoodLpBackend::default().solve(&problem).unwrap_err();
        assert!(matches!(err, SolverError::Unsupported { .. }));
    }
}
