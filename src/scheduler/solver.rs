//! CP-SAT style model facade lowered onto the HiGHS MILP backend.
//!
//! The timetable model is pure satisfaction over Booleans and tiny
//! integer domains, so half-reified implications lower to single linear
//! rows with bound-derived big-M coefficients.

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable};
use log::debug;
use std::time::{Duration, Instant};

/// Handle to a model variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    /// Negated literal, for implications that fire when the variable is 0
    pub fn negated(self) -> Lit {
        Lit {
            var: self,
            negated: true,
        }
    }
}

/// A Boolean variable or its negation
#[derive(Debug, Clone, Copy)]
pub struct Lit {
    var: VarId,
    negated: bool,
}

impl From<VarId> for Lit {
    fn from(var: VarId) -> Self {
        Lit { var, negated: false }
    }
}

/// Integer linear expression over model variables
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(i64, VarId)>,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (1, v)).collect(),
        }
    }

    pub fn add_term(&mut self, coeff: i64, var: VarId) {
        self.terms.push((coeff, var));
    }

    pub fn plus(mut self, coeff: i64, var: VarId) -> Self {
        self.add_term(coeff, var);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(1, var)],
        }
    }
}

/// Comparison operator of a linear constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    lo: i64,
    hi: i64,
}

enum Post {
    Linear {
        expr: LinExpr,
        cmp: Cmp,
        rhs: i64,
    },
    /// literal true implies (expr cmp rhs)
    Implication {
        lit: Lit,
        expr: LinExpr,
        cmp: Cmp,
        rhs: i64,
    },
    /// target equals the Boolean maximum (OR) of the operands
    MaxEquality {
        target: VarId,
        over: Vec<VarId>,
    },
}

/// Result status of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

/// Integer assignment oracle over a completed solve
pub struct CpSolution {
    values: Vec<i64>,
}

impl CpSolution {
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.0]
    }

    pub fn is_true(&self, var: VarId) -> bool {
        self.value(var) != 0
    }
}

/// Outcome of a solve attempt
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub solution: Option<CpSolution>,
    pub wall_time: Duration,
    pub message: Option<String>,
}

/// A satisfaction model under construction
#[derive(Default)]
pub struct CpModel {
    bounds: Vec<Bounds>,
    posts: Vec<Post>,
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bool_var(&mut self) -> VarId {
        self.add_int_var(0, 1)
    }

    pub fn add_int_var(&mut self, lo: i64, hi: i64) -> VarId {
        debug_assert!(lo <= hi);
        let id = VarId(self.bounds.len());
        self.bounds.push(Bounds { lo, hi });
        id
    }

    pub fn num_vars(&self) -> usize {
        self.bounds.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.posts.len()
    }

    pub fn add_linear(&mut self, expr: LinExpr, cmp: Cmp, rhs: i64) {
        self.posts.push(Post::Linear { expr, cmp, rhs });
    }

    /// Half-reified constraint: when the literal holds, (expr cmp rhs) must
    /// hold; nothing is implied otherwise.
    pub fn add_reified_implication(
        &mut self,
        lit: impl Into<Lit>,
        expr: LinExpr,
        cmp: Cmp,
        rhs: i64,
    ) {
        self.posts.push(Post::Implication {
            lit: lit.into(),
            expr,
            cmp,
            rhs,
        });
    }

    /// target = max(over), with every operand Boolean: the OR reification
    pub fn add_max_equality(&mut self, target: VarId, over: &[VarId]) {
        self.posts.push(Post::MaxEquality {
            target,
            over: over.to_vec(),
        });
    }

    fn expr_bounds(&self, expr: &LinExpr) -> (i64, i64) {
        let mut lo = 0;
        let mut hi = 0;
        for &(coeff, var) in &expr.terms {
            let b = self.bounds[var.0];
            if coeff >= 0 {
                lo += coeff * b.lo;
                hi += coeff * b.hi;
            } else {
                lo += coeff * b.hi;
                hi += coeff * b.lo;
            }
        }
        (lo, hi)
    }

    /// Solve the model within a wall-clock budget
    pub fn solve(&self, time_limit: Duration) -> SolveOutcome {
        let started = Instant::now();

        let mut vars = ProblemVariables::new();
        let lp_vars: Vec<Variable> = self
            .bounds
            .iter()
            .map(|b| {
                if b.lo == 0 && b.hi == 1 {
                    vars.add(variable().binary())
                } else {
                    vars.add(variable().integer().min(b.lo as f64).max(b.hi as f64))
                }
            })
            .collect();

        let to_expr = |expr: &LinExpr| -> Expression {
            let mut e = Expression::default();
            for &(coeff, var) in &expr.terms {
                e += coeff as f64 * lp_vars[var.0];
            }
            e
        };

        // Satisfaction problem: constant objective, deterministic settings
        let mut model = vars
            .minimise(Expression::default())
            .using(highs)
            .set_option("output_flag", "false")
            .set_option("threads", 1)
            .set_option("random_seed", 0)
            .set_option("time_limit", time_limit.as_secs_f64());

        let mut rows = 0usize;
        fn post_row<M: SolverModel>(model: &mut M, e: Expression, cmp: Cmp, rhs: f64) {
            let c = match cmp {
                Cmp::Le => constraint::leq(e, rhs),
                Cmp::Ge => constraint::geq(e, rhs),
                Cmp::Eq => constraint::eq(e, rhs),
            };
            model.add_constraint(c);
        }

        for post in &self.posts {
            match post {
                Post::Linear { expr, cmp, rhs } => {
                    post_row(&mut model, to_expr(expr), *cmp, *rhs as f64);
                    rows += 1;
                }
                Post::Implication {
                    lit,
                    expr,
                    cmp,
                    rhs,
                } => {
                    let (lo, hi) = self.expr_bounds(expr);
                    if matches!(*cmp, Cmp::Le | Cmp::Eq) && hi > *rhs {
                        // expr <= rhs whenever the literal holds
                        let slack = hi - *rhs;
                        let (coeff, bound) = if lit.negated {
                            (-slack, *rhs)
                        } else {
                            (slack, hi)
                        };
                        let e = to_expr(&expr.clone().plus(coeff, lit.var));
                        post_row(&mut model, e, Cmp::Le, bound as f64);
                        rows += 1;
                    }
                    if matches!(*cmp, Cmp::Ge | Cmp::Eq) && lo < *rhs {
                        // expr >= rhs whenever the literal holds
                        let slack = lo - *rhs;
                        let (coeff, bound) = if lit.negated {
                            (-slack, *rhs)
                        } else {
                            (slack, lo)
                        };
                        let e = to_expr(&expr.clone().plus(coeff, lit.var));
                        post_row(&mut model, e, Cmp::Ge, bound as f64);
                        rows += 1;
                    }
                }
                Post::MaxEquality { target, over } => {
                    if over.is_empty() {
                        post_row(&mut model, to_expr(&(*target).into()), Cmp::Eq, 0.0);
                        rows += 1;
                        continue;
                    }
                    for &v in over {
                        let e = to_expr(&LinExpr::from(*target).plus(-1, v));
                        post_row(&mut model, e, Cmp::Ge, 0.0);
                        rows += 1;
                    }
                    let mut e = LinExpr::from(*target);
                    for &v in over {
                        e.add_term(-1, v);
                    }
                    post_row(&mut model, to_expr(&e), Cmp::Le, 0.0);
                    rows += 1;
                }
            }
        }

        debug!(
            "lowered {} vars / {} posts into {} MILP rows",
            self.bounds.len(),
            self.posts.len(),
            rows
        );

        match model.solve() {
            Ok(solution) => {
                let values = lp_vars
                    .iter()
                    .map(|v| solution.value(*v).round() as i64)
                    .collect();
                SolveOutcome {
                    status: SolveStatus::Optimal,
                    solution: Some(CpSolution { values }),
                    wall_time: started.elapsed(),
                    message: None,
                }
            }
            Err(ResolutionError::Infeasible) => SolveOutcome {
                status: SolveStatus::Infeasible,
                solution: None,
                wall_time: started.elapsed(),
                message: None,
            },
            Err(other) => SolveOutcome {
                status: SolveStatus::Unknown,
                solution: None,
                wall_time: started.elapsed(),
                message: Some(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(10);

    #[test]
    fn test_linear_equality_is_respected() {
        let mut m = CpModel::new();
        let a = m.add_bool_var();
        let b = m.add_bool_var();
        m.add_linear(LinExpr::sum([a, b]), Cmp::Eq, 1);
        m.add_linear(a.into(), Cmp::Eq, 1);

        let outcome = m.solve(LIMIT);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        let sol = outcome.solution.unwrap();
        assert_eq!(sol.value(a), 1);
        assert_eq!(sol.value(b), 0);
    }

    #[test]
    fn test_implication_fires_when_literal_true() {
        let mut m = CpModel::new();
        let flag = m.add_bool_var();
        let x = m.add_int_var(0, 5);
        m.add_linear(flag.into(), Cmp::Eq, 1);
        m.add_linear(x.into(), Cmp::Ge, 3);
        m.add_reified_implication(flag, x.into(), Cmp::Le, 2);

        let outcome = m.solve(LIMIT);
        assert_eq!(outcome.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_implication_vacuous_when_literal_false() {
        let mut m = CpModel::new();
        let flag = m.add_bool_var();
        let x = m.add_int_var(0, 5);
        m.add_linear(flag.into(), Cmp::Eq, 0);
        m.add_linear(x.into(), Cmp::Ge, 3);
        m.add_reified_implication(flag, x.into(), Cmp::Le, 2);

        let outcome = m.solve(LIMIT);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!(outcome.solution.unwrap().value(x) >= 3);
    }

    #[test]
    fn test_negated_literal_implication() {
        let mut m = CpModel::new();
        let flag = m.add_bool_var();
        let x = m.add_int_var(0, 5);
        m.add_linear(flag.into(), Cmp::Eq, 0);
        m.add_reified_implication(flag.negated(), x.into(), Cmp::Eq, 4);

        let outcome = m.solve(LIMIT);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.solution.unwrap().value(x), 4);
    }

    #[test]
    fn test_max_equality_is_boolean_or() {
        let mut m = CpModel::new();
        let a = m.add_bool_var();
        let b = m.add_bool_var();
        let or = m.add_bool_var();
        m.add_max_equality(or, &[a, b]);
        m.add_linear(a.into(), Cmp::Eq, 0);
        m.add_linear(b.into(), Cmp::Eq, 1);

        let sol = m.solve(LIMIT).solution.unwrap();
        assert!(sol.is_true(or));

        let mut m = CpModel::new();
        let a = m.add_bool_var();
        let b = m.add_bool_var();
        let or = m.add_bool_var();
        m.add_max_equality(or, &[a, b]);
        m.add_linear(a.into(), Cmp::Eq, 0);
        m.add_linear(b.into(), Cmp::Eq, 0);

        let sol = m.solve(LIMIT).solution.unwrap();
        assert!(!sol.is_true(or));
    }

    #[test]
    fn test_infeasible_status() {
        let mut m = CpModel::new();
        let a = m.add_bool_var();
        m.add_linear(a.into(), Cmp::Ge, 2);
        assert_eq!(m.solve(LIMIT).status, SolveStatus::Infeasible);
    }
}
