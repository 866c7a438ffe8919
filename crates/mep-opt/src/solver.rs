//! Solver adapter.
//!
//! Translates a [`LinearModel`] into a good_lp problem and runs it on one of
//! the compiled-in backends:
//!
//! | Backend    | Feature           | Problems    |
//! |------------|-------------------|-------------|
//! | `clarabel` | `solver-clarabel` | LP          |
//! | `microlp`  | `solver-microlp`  | LP and MILP |
//! | `highs`    | `solver-highs`    | LP and MILP |
//!
//! `auto` picks clarabel for LPs and microlp for MILPs, falling back to
//! whatever else is compiled in.

use crate::error::{OptError, OptResult};
use crate::model::{LinearModel, ProblemClass, Sense};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, Solver, SolverModel, Variable,
};
use mep_core::SolverSettings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Final state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    SolverError,
    TimeLimit,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unbounded => "UNBOUNDED",
            SolveStatus::SolverError => "SOLVER_ERROR",
            SolveStatus::TimeLimit => "TIME_LIMIT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    Auto,
    Clarabel,
    Microlp,
    Highs,
}

impl SolverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverKind::Auto => "auto",
            SolverKind::Clarabel => "clarabel",
            SolverKind::Microlp => "microlp",
            SolverKind::Highs => "highs",
        }
    }

    /// Backends compiled into this build.
    pub fn available() -> Vec<&'static str> {
        AVAILABLE_SOLVERS.to_vec()
    }

    pub fn supports_integers(self) -> bool {
        matches!(self, SolverKind::Microlp | SolverKind::Highs)
    }

    /// Concrete backend for a problem class.
    pub fn resolve(self, class: ProblemClass) -> SolverKind {
        if self != SolverKind::Auto {
            return self;
        }
        let preferred: &[SolverKind] = match class {
            ProblemClass::LinearProgram => {
                &[SolverKind::Clarabel, SolverKind::Microlp, SolverKind::Highs]
            }
            ProblemClass::MixedInteger => &[SolverKind::Microlp, SolverKind::Highs],
        };
        preferred
            .iter()
            .copied()
            .find(|kind| AVAILABLE_SOLVERS.contains(&kind.as_str()))
            .unwrap_or(SolverKind::Auto)
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const AVAILABLE_SOLVERS: &[&str] = &[
    #[cfg(feature = "solver-clarabel")]
    "clarabel",
    #[cfg(feature = "solver-microlp")]
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_solver_error(label: &str) -> OptError {
    OptError::UnknownSolver(format!(
        "'{}'; supported values: auto, {}",
        label,
        SolverKind::available().join(", ")
    ))
}

impl FromStr for SolverKind {
    type Err = OptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "auto" => return Ok(SolverKind::Auto),
            "clarabel" => SolverKind::Clarabel,
            "microlp" => SolverKind::Microlp,
            "highs" => SolverKind::Highs,
            other => return Err(unknown_solver_error(other)),
        };
        if AVAILABLE_SOLVERS.contains(&kind.as_str()) {
            Ok(kind)
        } else {
            Err(unknown_solver_error(&normalized))
        }
    }
}

/// Result of one solve. Primal values are present only when optimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    /// One value per model variable, indexed by `VarId`
    pub values: Option<Vec<f64>>,
    pub message: String,
    pub solver: SolverKind,
    pub solve_time: Duration,
}

impl SolveOutcome {
    fn failed(status: SolveStatus, solver: SolverKind, message: impl Into<String>) -> Self {
        Self {
            status,
            objective: None,
            values: None,
            message: message.into(),
            solver,
            solve_time: Duration::ZERO,
        }
    }

    /// Turn a non-optimal outcome into [`OptError::SolverStatus`].
    pub fn into_result(self) -> OptResult<Self> {
        if self.status.is_optimal() {
            Ok(self)
        } else {
            Err(OptError::SolverStatus {
                status: self.status,
                message: self.message,
            })
        }
    }
}

/// Solve `model` with the backend named in `settings`.
///
/// Unknown or missing backends are errors; every solver-side failure is
/// reported through the outcome's status.
pub fn solve(model: &LinearModel, settings: &SolverSettings) -> OptResult<SolveOutcome> {
    let requested: SolverKind = settings.name.parse()?;
    let class = model.problem_class();
    let kind = requested.resolve(class);
    let stats = model.stats();

    if kind == SolverKind::Auto {
        return Ok(SolveOutcome::failed(
            SolveStatus::SolverError,
            kind,
            format!("no compiled-in backend can solve a {class:?} problem"),
        ));
    }
    if class == ProblemClass::MixedInteger && !kind.supports_integers() {
        return Ok(SolveOutcome::failed(
            SolveStatus::SolverError,
            kind,
            format!("{kind} cannot solve problems with integer variables"),
        ));
    }
    if let Some(row) = model
        .rows()
        .iter()
        .find(|row| row.terms.is_empty() && row.violation(&[]) > 0.0)
    {
        return Ok(SolveOutcome::failed(
            SolveStatus::Infeasible,
            kind,
            format!("row '{}' has no variables and cannot be satisfied", row.name),
        ));
    }
    let limit = settings.time_limit_seconds;
    if kind == SolverKind::Clarabel && limit.is_some() {
        warn!(solver = %kind, "time limit is not supported by this backend; ignored");
    }

    info!(
        solver = %kind,
        variables = stats.variables,
        integer_variables = stats.integer_variables,
        rows = stats.rows,
        "solving model"
    );

    let outcome = match kind {
        #[cfg(feature = "solver-clarabel")]
        SolverKind::Clarabel => run(model, good_lp::solvers::clarabel::clarabel, kind, None, |m| m),
        #[cfg(feature = "solver-microlp")]
        SolverKind::Microlp => run(model, good_lp::solvers::microlp::microlp, kind, limit, |m| {
            with_limit(m, limit)
        }),
        #[cfg(feature = "solver-highs")]
        SolverKind::Highs => {
            let verbose = settings.verbose;
            run(model, good_lp::solvers::highs::highs, kind, limit, move |mut m| {
                m.set_verbose(verbose);
                with_limit(m, limit)
            })
        }
        other => return Err(unknown_solver_error(other.as_str())),
    };

    info!(
        solver = %kind,
        status = %outcome.status,
        objective = outcome.objective,
        solve_time_ms = outcome.solve_time.as_millis() as u64,
        "solve finished"
    );
    Ok(outcome)
}

fn linear_expression(terms: &[(crate::model::VarId, f64)], handles: &[Variable]) -> Expression {
    let mut expr = Expression::from(0.0);
    for &(var, coef) in terms {
        expr += coef * handles[var.index()];
    }
    expr
}

#[cfg(any(feature = "solver-microlp", feature = "solver-highs"))]
fn with_limit<M: good_lp::WithTimeLimit>(model: M, seconds: Option<f64>) -> M {
    match seconds {
        Some(seconds) => model.with_time_limit(seconds),
        None => model,
    }
}

fn run<S>(
    model: &LinearModel,
    solver: S,
    kind: SolverKind,
    time_limit: Option<f64>,
    configure: impl FnOnce(S::Model) -> S::Model,
) -> SolveOutcome
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError>,
{
    let start = Instant::now();
    let mut problem = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|v| {
            let definition = variable().min(v.lower).max(v.upper);
            problem.add(if v.integer {
                definition.integer()
            } else {
                definition
            })
        })
        .collect();

    let objective = linear_expression(model.objective(), &handles);
    let mut lp = configure(problem.minimise(objective).using(solver));
    for row in model.rows().iter().filter(|row| !row.terms.is_empty()) {
        let lhs = linear_expression(&row.terms, &handles);
        let constraint = match row.sense {
            Sense::Eq => constraint::eq(lhs, row.rhs),
            Sense::Le => constraint::leq(lhs, row.rhs),
            Sense::Ge => constraint::geq(lhs, row.rhs),
        };
        lp.add_constraint(constraint);
    }

    match lp.solve() {
        // An incumbent cut off by the time budget is not reported as a solution.
        Ok(solution) if matches!(solution.status(), SolutionStatus::TimeLimit) => SolveOutcome {
            solve_time: start.elapsed(),
            ..SolveOutcome::failed(
                SolveStatus::TimeLimit,
                kind,
                "time limit reached before optimality was proven",
            )
        },
        Ok(solution) => {
            if matches!(solution.status(), SolutionStatus::GapLimit) {
                debug!(solver = %kind, "solution accepted within the backend's MIP gap");
            }
            let values: Vec<f64> = handles.iter().map(|&var| solution.value(var)).collect();
            SolveOutcome {
                status: SolveStatus::Optimal,
                objective: Some(model.objective_value(&values)),
                values: Some(values),
                message: String::new(),
                solver: kind,
                solve_time: start.elapsed(),
            }
        }
        Err(err) => {
            let solve_time = start.elapsed();
            let status = status_of(&err, time_limit, solve_time);
            SolveOutcome {
                solve_time,
                ..SolveOutcome::failed(status, kind, err.to_string())
            }
        }
    }
}

/// Backend failures once the time budget is spent count as hitting the limit.
fn status_of(err: &ResolutionError, time_limit: Option<f64>, elapsed: Duration) -> SolveStatus {
    match err {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        ResolutionError::Unbounded => SolveStatus::Unbounded,
        ResolutionError::Other(_) | ResolutionError::Str(_)
            if time_limit.is_some_and(|limit| elapsed.as_secs_f64() >= limit) =>
        {
            SolveStatus::TimeLimit
        }
        _ => SolveStatus::SolverError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConstraintFamily;
    use crate::model::{LinearExpr, VarKey, VarKind};
    use mep_core::ElementKind;

    fn key(hour: usize) -> VarKey {
        VarKey::hourly(ElementKind::Generator, "PP", VarKind::Generation, 0, hour)
    }

    /// min x + 2y  s.t.  x + y >= 4, x <= 3
    fn small_lp() -> LinearModel {
        let mut model = LinearModel::new(1e-12);
        let x = model.add_variable(key(0), 0.0, 3.0, false);
        let y = model.add_variable(key(1), 0.0, f64::INFINITY, false);
        let mut cover = LinearExpr::new();
        cover.add(x, 1.0).add(y, 1.0);
        model.add_row("cover".into(), ConstraintFamily::Balance, &cover, Sense::Ge, 4.0);
        let mut objective = LinearExpr::new();
        objective.add(x, 1.0).add(y, 2.0);
        model.set_objective(&objective);
        model
    }

    fn settings(name: &str) -> SolverSettings {
        SolverSettings {
            name: name.to_string(),
            ..SolverSettings::default()
        }
    }

    #[test]
    fn parses_solver_names() {
        assert_eq!("AUTO".parse::<SolverKind>().unwrap(), SolverKind::Auto);
        assert_eq!(" microlp ".parse::<SolverKind>().unwrap(), SolverKind::Microlp);
        let err = "gurobi".parse::<SolverKind>().unwrap_err();
        assert!(matches!(err, OptError::UnknownSolver(_)));
    }

    #[test]
    fn auto_prefers_integer_capable_backend_for_milp() {
        assert_eq!(
            SolverKind::Auto.resolve(ProblemClass::MixedInteger),
            SolverKind::Microlp
        );
        assert_eq!(
            SolverKind::Auto.resolve(ProblemClass::LinearProgram),
            SolverKind::Clarabel
        );
        assert_eq!(SolverKind::Highs.resolve(ProblemClass::LinearProgram), SolverKind::Highs);
    }

    #[test]
    fn microlp_solves_small_lp() {
        let outcome = solve(&small_lp(), &settings("microlp")).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.objective.unwrap() - 5.0).abs() < 1e-6);
        let values = outcome.values.unwrap();
        assert!((values[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn infeasible_model_reports_status() {
        let mut model = small_lp();
        let mut expr = LinearExpr::new();
        expr.add(model.find(&key(1)).unwrap(), 1.0);
        model.add_row("cap".into(), ConstraintFamily::Generation, &expr, Sense::Le, 0.5);

        let outcome = solve(&model, &settings("microlp")).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_none());
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(
            err,
            OptError::SolverStatus {
                status: SolveStatus::Infeasible,
                ..
            }
        ));
    }

    #[test]
    fn unsatisfiable_empty_row_is_infeasible_without_solving() {
        let mut model = small_lp();
        model.add_row(
            "empty".into(),
            ConstraintFamily::Balance,
            &LinearExpr::new(),
            Sense::Eq,
            2.0,
        );
        let outcome = solve(&model, &settings("auto")).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
    }

    #[test]
    fn microlp_stops_at_zero_time_limit() {
        let settings = SolverSettings {
            time_limit_seconds: Some(0.0),
            ..settings("microlp")
        };
        let outcome = solve(&small_lp(), &settings).unwrap();
        assert_eq!(outcome.status, SolveStatus::TimeLimit);
        assert!(outcome.values.is_none());
        assert!(outcome.objective.is_none());
    }

    #[test]
    fn backend_failure_maps_to_time_limit_only_after_budget() {
        let err = ResolutionError::Other("interrupted");
        let spent = Duration::from_millis(1500);
        assert_eq!(status_of(&err, Some(1.0), spent), SolveStatus::TimeLimit);
        assert_eq!(status_of(&err, Some(2.0), spent), SolveStatus::SolverError);
        assert_eq!(status_of(&err, None, spent), SolveStatus::SolverError);
        assert_eq!(
            status_of(&ResolutionError::Infeasible, Some(0.0), spent),
            SolveStatus::Infeasible
        );
    }

    #[test]
    fn clarabel_refuses_integer_models() {
        let mut model = small_lp();
        model.add_variable(key(2), 0.0, 1.0, true);
        let outcome = solve(&model, &settings("clarabel")).unwrap();
        assert_eq!(outcome.status, SolveStatus::SolverError);
        assert_eq!(outcome.solver, SolverKind::Clarabel);
    }

    #[test]
    fn status_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&SolveStatus::TimeLimit).unwrap(),
            "\"TIME_LIMIT\""
        );
        assert_eq!(SolveStatus::SolverError.to_string(), "SOLVER_ERROR");
    }
}
