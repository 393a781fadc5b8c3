//! L-BFGS — limited-memory quasi-Newton ascent with a Moré–Thuente line
//! search.
//!
//! Purpose
//! -------
//! Maximize a smooth flat objective using curvature information from the
//! last `m` steps, without ever forming a matrix.
//!
//! Key behaviors
//! -------------
//! - The two-loop recursion turns the fitness gradient `g` into an ascent
//!   direction `d = H·g`, with `H` built from stored pairs
//!   `s = x_{k+1} − x_k`, `y = g_k − g_{k+1}` and scaled by
//!   `H0 = sᵀy / yᵀy` of the newest pair.
//! - If `d` is not an ascent direction the history is discarded and the
//!   run restarts along `g`.
//! - The first step length with an empty history is `1 / ‖g‖₂`, then `1`.
//! - A pair is stored only when `sᵀy > 1e-10·yᵀy`, which keeps `H`
//!   positive definite.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fitness never decreases between accepted iterates.
//! - The starting fitness must be finite; it is evaluated on its own so an
//!   impossible start fails before any gradient evaluation.
//! - A line search cut short by the budget without improvement ends the run
//!   with `Termination::EvaluationBudgetExhausted`.
//! - The line search never exceeds the remaining evaluation budget.
//! - A line search that fails but still improves the fitness is accepted
//!   with a history reset; one that does not improve it ends the run with
//!   `Termination::LineSearchFailed`.
use argmin_math::ArgminL2Norm;
use log::{debug, info, warn};

use crate::optimization::{
    algorithms::{
        convergence::ValueChecker,
        history::RingHistory,
        line_search::{MoreThuente, MoreThuenteConfig},
        outcome::{FlatOutcome, Termination},
        GradientOptimizationAlgorithm,
    },
    errors::{OptError, OptResult},
    oracle::FlatObjective,
    types::{Grad, Theta, DEFAULT_LBFGS_HISTORY, DEFAULT_MAX_EVALUATIONS},
    validation::{verify_max_evaluations, verify_positive, verify_start_fitness},
};

const ASCENT_COSINE: f64 = 1e-10;
const CURVATURE_EPS: f64 = 1e-10;

/// L-BFGS configuration.
///
/// Default: `history_size = 7`, `max_evaluations = 10_000`,
/// `gradient_tolerance = 1e-6`, `relative_threshold = absolute_threshold = 1e-8`,
/// default Moré–Thuente parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbfgsConfig {
    pub history_size: usize,
    pub max_evaluations: usize,
    pub gradient_tolerance: f64,
    pub relative_threshold: f64,
    pub absolute_threshold: f64,
    pub line_search: MoreThuenteConfig,
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_LBFGS_HISTORY,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            gradient_tolerance: 1e-6,
            relative_threshold: 1e-8,
            absolute_threshold: 1e-8,
            line_search: MoreThuenteConfig::default(),
        }
    }
}

/// Validated L-BFGS optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lbfgs {
    config: LbfgsConfig,
    line_search: MoreThuente,
    value_checker: ValueChecker,
}

impl Lbfgs {
    /// # Errors
    /// - [`OptError::InvalidHistorySize`] if `history_size == 0`.
    /// - [`OptError::InvalidMaxEvaluations`] if `max_evaluations == 0`.
    /// - [`OptError::InvalidHyperparameter`] for a non-positive tolerance or
    ///   invalid line-search parameters.
    pub fn new(config: LbfgsConfig) -> OptResult<Self> {
        if config.history_size == 0 {
            return Err(OptError::InvalidHistorySize {
                size: config.history_size,
                reason: "L-BFGS history size must be greater than zero.",
            });
        }
        verify_max_evaluations(config.max_evaluations)?;
        verify_positive("gradient_tolerance", config.gradient_tolerance)?;
        let value_checker = ValueChecker::new(config.relative_threshold, config.absolute_threshold)?;
        let line_search = MoreThuente::new(config.line_search)?;
        Ok(Self { config, line_search, value_checker })
    }

    pub fn config(&self) -> &LbfgsConfig {
        &self.config
    }
}

impl Default for Lbfgs {
    fn default() -> Self {
        Self {
            config: LbfgsConfig::default(),
            line_search: MoreThuente::default(),
            value_checker: ValueChecker::default(),
        }
    }
}

impl GradientOptimizationAlgorithm for Lbfgs {
    fn name(&self) -> &'static str {
        "L-BFGS"
    }

    fn optimize<O: FlatObjective + ?Sized>(
        &self, objective: &O, start: Theta,
    ) -> OptResult<FlatOutcome> {
        let LbfgsConfig { history_size, max_evaluations, gradient_tolerance, .. } = self.config;
        let mut f = objective.fitness(&start)?;
        verify_start_fitness(f)?;
        let mut g = objective.gradient(&start)?;
        let mut x = start;
        let mut evaluations = 1usize;
        let mut iterations = 0usize;
        let mut history = RingHistory::new(history_size, x.len());
        let mut trace = vec![f];

        let termination = loop {
            if max_abs(&g) <= gradient_tolerance {
                break Termination::GradientTolerance;
            }
            if evaluations >= max_evaluations {
                break Termination::EvaluationBudgetExhausted;
            }

            let mut direction = two_loop(&history, &g);
            if !(g.dot(&direction) > ASCENT_COSINE * g.l2_norm() * direction.l2_norm()) {
                if !history.is_empty() {
                    warn!("lbfgs: direction lost ascent at iteration {iterations}; resetting history");
                }
                history.clear();
                direction = g.clone();
            }
            let initial_step = if history.is_empty() { 1.0 / g.l2_norm() } else { 1.0 };

            let result = self.line_search.search_within(
                objective,
                &x,
                f,
                &g,
                &direction,
                initial_step,
                max_evaluations - evaluations,
            )?;
            evaluations += result.evaluations;
            iterations += 1;

            if !result.status.is_converged() {
                if result.fitness > f {
                    warn!(
                        "lbfgs: accepting improving step after line search stop ({}); resetting history",
                        result.status
                    );
                    history.clear();
                } else if evaluations >= max_evaluations {
                    break Termination::EvaluationBudgetExhausted;
                } else {
                    warn!("lbfgs: line search failed without improvement ({})", result.status);
                    break Termination::LineSearchFailed { status: result.status };
                }
            }

            let s = &result.point - &x;
            let y = &g - &result.gradient;
            let sy = s.dot(&y);
            if sy > CURVATURE_EPS * y.dot(&y) {
                history.push(&s, &y, 1.0 / sy);
            }

            let previous = f;
            x = result.point;
            f = result.fitness;
            g = result.gradient;
            trace.push(f);
            debug!(
                "lbfgs: iteration {iterations}, fitness = {f:.6e}, step = {:.3e}, |g|max = {:.3e}",
                result.step,
                max_abs(&g)
            );
            if self.value_checker.has_converged(previous, f) {
                break Termination::ValueTolerance;
            }
        };

        info!("lbfgs: {termination} after {iterations} iterations, fitness = {f:.6}");
        Ok(FlatOutcome::new(x, f, termination, iterations, evaluations)?.with_trace(trace))
    }
}

/// Two-loop recursion: `H·g` for the inverse-curvature estimate in `history`.
fn two_loop(history: &RingHistory, g: &Grad) -> Theta {
    let k = history.len();
    let mut q = g.clone();
    let mut alpha = vec![0.0; k];
    for i in (0..k).rev() {
        let a = history.rho(i) * history.s(i).dot(&q);
        alpha[i] = a;
        q.scaled_add(-a, &history.y(i));
    }
    if k > 0 {
        let y = history.y(k - 1);
        q *= history.s(k - 1).dot(&y) / y.dot(&y);
    }
    for (i, a) in alpha.iter().enumerate() {
        let b = history.rho(i) * history.y(i).dot(&q);
        q.scaled_add(a - b, &history.s(i));
    }
    q
}

fn max_abs(v: &Grad) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}
