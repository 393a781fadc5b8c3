//! line_search — Moré–Thuente line search with strong Wolfe conditions.
//!
//! Purpose
//! -------
//! Given a point `x`, its fitness and gradient, and an ascent direction `d`,
//! find a step `α > 0` such that
//!
//! - sufficient increase: `f(x + αd) ≥ f(x) + ftol·α·∇f(x)ᵀd`, and
//! - curvature: `|∇f(x + αd)ᵀd| ≤ gtol·∇f(x)ᵀd`.
//!
//! Key behaviors
//! -------------
//! - Follows MINPACK `cvsrch`/`cstep`: the search runs on
//!   `ψ(α) = −f(x + αd)`, keeps a bracket `[stx, sty]` of best and
//!   bounding trial steps, and picks each new trial by safeguarded
//!   cubic/quadratic interpolation. While no bracket exists, trials
//!   extrapolate by at most a factor of 4; once bracketed, a trial that
//!   fails to shrink the bracket by a third triggers bisection.
//! - Every stop is reported as a [`LineSearchStatus`] with the MINPACK
//!   info code (1 success, 2–6 distinct failures).
//! - A trial with non-finite fitness (impossible point) is discarded: the
//!   step is halved towards `stx` and later trials stay below it.
//!
//! Invariants & assumptions
//! ------------------------
//! - The direction must satisfy `∇f(x)ᵀd > 0`; otherwise the search fails
//!   with `NotAscentDirection` before evaluating anything.
//! - On success the accepted trial is returned. On any other status the
//!   best finite trial is returned, which is the starting point itself
//!   (step 0) if nothing improved.
//! - No more than `min(max_evaluations, budget)` oracle calls are made, and
//!   each one evaluates a new trial step; the best trial is held, never
//!   re-evaluated.
use std::fmt;

use crate::optimization::{
    errors::{OptError, OptResult},
    oracle::FlatObjective,
    types::{Fitness, Grad, Theta},
    validation::{verify_max_evaluations, verify_positive},
};

/// Stop reason of a line search, carrying the MINPACK info code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSearchStatus {
    /// Both strong Wolfe conditions hold.
    Converged = 1,
    /// The bracket is narrower than `xtol` relative to its right end.
    IntervalTooSmall = 2,
    /// The evaluation limit was reached.
    MaxEvaluations = 3,
    /// The step sits at `step_min` without meeting the conditions.
    StepAtMinimum = 4,
    /// The step sits at `step_max` and the fitness is still increasing.
    StepAtMaximum = 5,
    /// Rounding errors prevent further progress.
    RoundingErrors = 6,
}

impl LineSearchStatus {
    pub fn info_code(self) -> u8 {
        self as u8
    }

    pub fn is_converged(self) -> bool {
        self == LineSearchStatus::Converged
    }
}

impl fmt::Display for LineSearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LineSearchStatus::Converged => "strong Wolfe conditions satisfied",
            LineSearchStatus::IntervalTooSmall => "interval of uncertainty below xtol",
            LineSearchStatus::MaxEvaluations => "maximum evaluations reached",
            LineSearchStatus::StepAtMinimum => "step at lower bound",
            LineSearchStatus::StepAtMaximum => "step at upper bound",
            LineSearchStatus::RoundingErrors => "rounding errors prevent progress",
        };
        write!(f, "{text} (info = {})", self.info_code())
    }
}

/// Moré–Thuente parameters.
///
/// Default: `ftol = 1e-4`, `gtol = 0.9`, `xtol = 1e-15`,
/// `step_min = 1e-20`, `step_max = 1e20`, `max_evaluations = 20`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoreThuenteConfig {
    pub ftol: f64,
    pub gtol: f64,
    pub xtol: f64,
    pub step_min: f64,
    pub step_max: f64,
    pub max_evaluations: usize,
}

impl Default for MoreThuenteConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-4,
            gtol: 0.9,
            xtol: 1e-15,
            step_min: 1e-20,
            step_max: 1e20,
            max_evaluations: 20,
        }
    }
}

/// Validated Moré–Thuente line search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoreThuente {
    config: MoreThuenteConfig,
}

/// Outcome of one line search.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchResult {
    pub status: LineSearchStatus,
    pub step: f64,
    pub point: Theta,
    pub fitness: Fitness,
    pub gradient: Grad,
    pub evaluations: usize,
}

/// Trial step in the ψ frame: step, value and directional derivative.
#[derive(Debug, Clone, Copy)]
struct Endpoint {
    stp: f64,
    f: f64,
    d: f64,
}

impl Endpoint {
    /// Shift into the modified function `ψ(α) − α·dgtest`.
    fn modified(self, dgtest: f64) -> Self {
        Self { stp: self.stp, f: self.f - self.stp * dgtest, d: self.d - dgtest }
    }

    fn unmodified(self, dgtest: f64) -> Self {
        Self { stp: self.stp, f: self.f + self.stp * dgtest, d: self.d + dgtest }
    }
}

struct Trial {
    step: f64,
    point: Theta,
    fitness: Fitness,
    gradient: Grad,
}

impl Trial {
    fn into_result(self, status: LineSearchStatus, evaluations: usize) -> LineSearchResult {
        LineSearchResult {
            status,
            step: self.step,
            point: self.point,
            fitness: self.fitness,
            gradient: self.gradient,
            evaluations,
        }
    }
}

impl MoreThuente {
    /// # Errors
    /// - [`OptError::InvalidHyperparameter`] unless `ftol, gtol ∈ (0, 1)`,
    ///   `xtol ≥ 0` is finite, and `0 ≤ step_min < step_max`.
    /// - [`OptError::InvalidMaxEvaluations`] if `max_evaluations == 0`.
    pub fn new(config: MoreThuenteConfig) -> OptResult<Self> {
        for (name, value) in [("ftol", config.ftol), ("gtol", config.gtol)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(OptError::InvalidHyperparameter {
                    name,
                    value,
                    reason: "Value must lie in (0, 1).",
                });
            }
        }
        if !(config.xtol.is_finite() && config.xtol >= 0.0) {
            return Err(OptError::InvalidHyperparameter {
                name: "xtol",
                value: config.xtol,
                reason: "Value must be finite and non-negative.",
            });
        }
        if !(config.step_min >= 0.0) {
            return Err(OptError::InvalidHyperparameter {
                name: "step_min",
                value: config.step_min,
                reason: "Value must be non-negative.",
            });
        }
        verify_positive("step_max", config.step_max)?;
        if config.step_min >= config.step_max {
            return Err(OptError::InvalidHyperparameter {
                name: "step_min",
                value: config.step_min,
                reason: "Value must be below step_max.",
            });
        }
        verify_max_evaluations(config.max_evaluations)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MoreThuenteConfig {
        &self.config
    }

    /// Search along `direction` from `x` with the configured evaluation limit.
    ///
    /// # Errors
    /// See [`MoreThuente::search_within`].
    pub fn search<O: FlatObjective + ?Sized>(
        &self, objective: &O, x: &Theta, fitness: Fitness, gradient: &Grad, direction: &Theta,
        initial_step: f64,
    ) -> OptResult<LineSearchResult> {
        self.search_within(
            objective,
            x,
            fitness,
            gradient,
            direction,
            initial_step,
            self.config.max_evaluations,
        )
    }

    /// Search with at most `min(max_evaluations, budget)` oracle calls.
    ///
    /// Parameters
    /// ----------
    /// - `x`, `fitness`, `gradient`: the current point and the oracle's
    ///   answer there; no evaluation is spent on them.
    /// - `direction`: ascent direction, `gradientᵀdirection > 0`.
    /// - `initial_step`: first trial step, finite and positive.
    /// - `budget`: oracle calls the caller can still afford.
    ///
    /// Returns
    /// -------
    /// `OptResult<LineSearchResult>`
    ///   - On `Converged` the accepted trial.
    ///   - On any other status the best finite trial, which is `x` itself
    ///     (step 0) when nothing improved.
    ///
    /// Errors
    /// ------
    /// - [`OptError::InvalidLineSearchStep`] if `initial_step` is not finite
    ///   and positive.
    /// - [`OptError::NonFiniteFitness`] if the starting fitness is not finite.
    /// - [`OptError::NotAscentDirection`] if `gradientᵀdirection ≤ 0`.
    /// - [`OptError::InvalidMaxEvaluations`] if `budget == 0`.
    /// - Any error raised by the objective.
    #[allow(clippy::too_many_arguments)]
    pub fn search_within<O: FlatObjective + ?Sized>(
        &self, objective: &O, x: &Theta, fitness: Fitness, gradient: &Grad, direction: &Theta,
        initial_step: f64, budget: usize,
    ) -> OptResult<LineSearchResult> {
        if !(initial_step.is_finite() && initial_step > 0.0) {
            return Err(OptError::InvalidLineSearchStep {
                step: initial_step,
                reason: "Initial step must be finite and positive.",
            });
        }
        if !fitness.is_finite() {
            return Err(OptError::NonFiniteFitness { value: fitness });
        }
        let slope = gradient.dot(direction);
        if !(slope > 0.0) {
            return Err(OptError::NotAscentDirection { slope });
        }
        verify_max_evaluations(budget)?;

        let MoreThuenteConfig { ftol, gtol, xtol, step_min, step_max, max_evaluations } =
            self.config;
        let max_fev = max_evaluations.min(budget);
        let finit = -fitness;
        let dginit = -slope;
        let dgtest = ftol * dginit;

        let mut brackt = false;
        let mut stage1 = true;
        let mut cstep_ok = true;
        let mut nfev = 0usize;
        let mut width = step_max - step_min;
        let mut width1 = 2.0 * width;
        let mut stx = Endpoint { stp: 0.0, f: finit, d: dginit };
        let mut sty = stx;
        let mut stp = initial_step;
        let mut ceiling = f64::INFINITY;
        let mut best =
            Trial { step: 0.0, point: x.clone(), fitness, gradient: gradient.clone() };

        loop {
            let (stmin, stmax) = if brackt {
                (stx.stp.min(sty.stp), stx.stp.max(sty.stp))
            } else {
                (stx.stp, stp + 4.0 * (stp - stx.stp))
            };
            stp = stp.max(step_min).min(step_max);
            if stp >= ceiling {
                stp = stx.stp + 0.5 * (ceiling - stx.stp);
            }
            if (brackt && (stp <= stmin || stp >= stmax))
                || !cstep_ok
                || (brackt && stmax - stmin <= xtol * stmax)
            {
                stp = stx.stp;
            }

            let point = x + &(direction * stp);
            let (trial_fitness, trial_gradient) = objective.fitness_and_gradient(&point)?;
            nfev += 1;

            if !trial_fitness.is_finite() {
                if nfev >= max_fev {
                    return Ok(best.into_result(LineSearchStatus::MaxEvaluations, nfev));
                }
                ceiling = stp;
                stp = stx.stp + 0.5 * (stp - stx.stp);
                continue;
            }

            let f = -trial_fitness;
            let dg = -trial_gradient.dot(direction);
            let ftest1 = finit + stp * dgtest;
            let trial =
                Trial { step: stp, point, fitness: trial_fitness, gradient: trial_gradient };

            let mut status = None;
            if (brackt && (stp <= stmin || stp >= stmax)) || !cstep_ok {
                status = Some(LineSearchStatus::RoundingErrors);
            }
            if stp == step_max && f <= ftest1 && dg <= dgtest {
                status = Some(LineSearchStatus::StepAtMaximum);
            }
            if stp == step_min && (f > ftest1 || dg >= dgtest) {
                status = Some(LineSearchStatus::StepAtMinimum);
            }
            if nfev >= max_fev {
                status = Some(LineSearchStatus::MaxEvaluations);
            }
            if brackt && stmax - stmin <= xtol * stmax {
                status = Some(LineSearchStatus::IntervalTooSmall);
            }
            if f <= ftest1 && dg.abs() <= gtol * (-dginit) {
                status = Some(LineSearchStatus::Converged);
            }

            match status {
                Some(LineSearchStatus::Converged) => {
                    return Ok(trial.into_result(LineSearchStatus::Converged, nfev));
                }
                Some(other) => {
                    if trial.fitness > best.fitness {
                        best = trial;
                    }
                    return Ok(best.into_result(other, nfev));
                }
                None => {
                    if trial.fitness > best.fitness {
                        best = trial;
                    }
                }
            }

            if stage1 && f <= ftest1 && dg >= ftol.min(gtol) * dginit {
                stage1 = false;
            }

            let current = Endpoint { stp, f, d: dg };
            let next = if stage1 && f <= stx.f && f > ftest1 {
                let mut x_mod = stx.modified(dgtest);
                let mut y_mod = sty.modified(dgtest);
                let next = cstep(
                    &mut x_mod,
                    &mut y_mod,
                    current.modified(dgtest),
                    &mut brackt,
                    stmin,
                    stmax,
                );
                stx = x_mod.unmodified(dgtest);
                sty = y_mod.unmodified(dgtest);
                next
            } else {
                cstep(&mut stx, &mut sty, current, &mut brackt, stmin, stmax)
            };
            match next {
                Some(step) => stp = step,
                None => cstep_ok = false,
            }

            if brackt {
                if (sty.stp - stx.stp).abs() >= 0.66 * width1 {
                    stp = stx.stp + 0.5 * (sty.stp - stx.stp);
                }
                width1 = width;
                width = (sty.stp - stx.stp).abs();
            }
        }
    }
}

impl Default for MoreThuente {
    fn default() -> Self {
        Self { config: MoreThuenteConfig::default() }
    }
}

/// Safeguarded step update (MINPACK `cstep`).
///
/// `x` is the endpoint with the least ψ so far, `y` the other end of the
/// interval, `trial` the latest evaluation. Updates the interval in place
/// and returns the next trial step, or `None` for inconsistent input.
fn cstep(
    x: &mut Endpoint, y: &mut Endpoint, trial: Endpoint, brackt: &mut bool, stpmin: f64,
    stpmax: f64,
) -> Option<f64> {
    let Endpoint { stp, f: fp, d: dp } = trial;
    let Endpoint { stp: stx, f: fx, d: dx } = *x;
    if (*brackt && (stp <= stx.min(y.stp) || stp >= stx.max(y.stp)))
        || dx * (stp - stx) >= 0.0
        || stpmax < stpmin
    {
        return None;
    }
    let sgnd = dp * dx.signum();
    let bound;
    let stpf;

    if fp > fx {
        // Higher value: the minimum is bracketed.
        bound = true;
        let theta = 3.0 * (fx - fp) / (stp - stx) + dx + dp;
        let mut gamma = cubic_gamma(theta, dx, dp);
        if stp < stx {
            gamma = -gamma;
        }
        let p = (gamma - dx) + theta;
        let q = ((gamma - dx) + gamma) + dp;
        let stpc = stx + (p / q) * (stp - stx);
        let stpq = stx + ((dx / ((fx - fp) / (stp - stx) + dx)) / 2.0) * (stp - stx);
        stpf = if (stpc - stx).abs() < (stpq - stx).abs() {
            stpc
        } else {
            stpc + (stpq - stpc) / 2.0
        };
        *brackt = true;
    } else if sgnd < 0.0 {
        // Derivatives of opposite sign: the minimum is bracketed.
        bound = false;
        let theta = 3.0 * (fx - fp) / (stp - stx) + dx + dp;
        let mut gamma = cubic_gamma(theta, dx, dp);
        if stp > stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = ((gamma - dp) + gamma) + dx;
        let stpc = stp + (p / q) * (stx - stp);
        let stpq = stp + (dp / (dp - dx)) * (stx - stp);
        stpf = if (stpc - stp).abs() > (stpq - stp).abs() { stpc } else { stpq };
        *brackt = true;
    } else if dp.abs() < dx.abs() {
        // Same sign, decreasing magnitude.
        bound = true;
        let theta = 3.0 * (fx - fp) / (stp - stx) + dx + dp;
        let mut gamma = cubic_gamma(theta, dx, dp);
        if stp > stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = (gamma + (dx - dp)) + gamma;
        let r = p / q;
        let stpc = if r < 0.0 && gamma != 0.0 {
            stp + r * (stx - stp)
        } else if stp > stx {
            stpmax
        } else {
            stpmin
        };
        let stpq = stp + (dp / (dp - dx)) * (stx - stp);
        let (dc, dq) = ((stp - stpc).abs(), (stp - stpq).abs());
        stpf = if *brackt {
            if dc < dq { stpc } else { stpq }
        } else if dc > dq {
            stpc
        } else {
            stpq
        };
    } else {
        // Same sign, non-decreasing magnitude.
        bound = false;
        stpf = if *brackt {
            let theta = 3.0 * (fp - y.f) / (y.stp - stp) + y.d + dp;
            let mut gamma = cubic_gamma(theta, y.d, dp);
            if stp > y.stp {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = ((gamma - dp) + gamma) + y.d;
            stp + (p / q) * (y.stp - stp)
        } else if stp > stx {
            stpmax
        } else {
            stpmin
        };
    }

    if fp > fx {
        *y = trial;
    } else {
        if sgnd < 0.0 {
            *y = *x;
        }
        *x = trial;
    }

    let mut next = stpf.min(stpmax).max(stpmin);
    if *brackt && bound {
        let limit = x.stp + 0.66 * (y.stp - x.stp);
        next = if y.stp > x.stp { next.min(limit) } else { next.max(limit) };
    }
    Some(next)
}

/// `γ` of the cubic interpolant, scaled to avoid overflow.
fn cubic_gamma(theta: f64, d1: f64, d2: f64) -> f64 {
    let s = theta.abs().max(d1.abs()).max(d2.abs());
    s * ((theta / s).powi(2) - (d1 / s) * (d2 / s)).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::algorithms::test_objectives::{Barrier, Counting, Quartic};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn start(objective: &impl FlatObjective) -> (Theta, Fitness, Grad) {
        let x = array![0.0];
        let (f, g) = objective.fitness_and_gradient(&x).expect("start should evaluate");
        (x, f, g)
    }

    fn search_with(config: MoreThuenteConfig, initial_step: f64) -> LineSearchResult {
        let (x, f, g) = start(&Quartic);
        MoreThuente::new(config)
            .expect("config should be valid")
            .search(&Quartic, &x, f, &g, &array![1.0], initial_step)
            .expect("search should succeed")
    }

    #[test]
    // Purpose
    // -------
    // Accepted steps satisfy both strong Wolfe conditions, whatever the
    // initial step.
    //
    // Given
    // -----
    // - f(x) = -(x - 2)⁴ - (x - 2)² from x = 0 along d = +1
    //   (f0 = -20, f0' = 36), default parameters.
    //
    // Expect
    // ------
    // - Status `Converged` (info 1) and both conditions hold at the step.
    fn accepted_steps_satisfy_strong_wolfe_conditions() {
        let config = MoreThuenteConfig::default();
        for initial_step in [1e-3, 0.1, 1.0, 10.0, 100.0] {
            let result = search_with(config, initial_step);

            assert_eq!(result.status, LineSearchStatus::Converged);
            assert_eq!(result.status.info_code(), 1);
            assert!(result.fitness >= -20.0 + config.ftol * result.step * 36.0);
            assert!(result.gradient[0].abs() <= config.gtol * 36.0);
            assert_relative_eq!(result.point[0], result.step);
        }
    }

    #[test]
    // Purpose
    // -------
    // Tight curvature tolerance drives the search onto the exact maximizer.
    fn tight_curvature_tolerance_finds_the_maximizer() {
        let config = MoreThuenteConfig { gtol: 1e-12, max_evaluations: 100, ..Default::default() };

        let result = search_with(config, 1.0);

        assert_eq!(result.status, LineSearchStatus::Converged);
        assert_relative_eq!(result.step, 2.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // With ftol = 1e-3, gtol = 0.1 and α0 = 0.5 the search brackets and
    // accepts α = 2.5.
    fn bracketing_search_accepts_interpolated_step() {
        let config = MoreThuenteConfig { ftol: 1e-3, gtol: 0.1, ..Default::default() };

        let result = search_with(config, 0.5);

        assert_eq!(result.status, LineSearchStatus::Converged);
        assert_relative_eq!(result.step, 2.5, epsilon = 1e-12);
        assert_relative_eq!(result.fitness, -0.3125, epsilon = 1e-12);
        assert_relative_eq!(result.gradient[0], -1.5, epsilon = 1e-12);
        assert_eq!(result.evaluations, 2);
    }

    #[test]
    // Purpose
    // -------
    // Each failure mode reports its own MINPACK info code.
    fn failure_statuses_have_distinct_codes() {
        // Step capped below the acceptable region: info 5 at step_max.
        let capped = search_with(
            MoreThuenteConfig { gtol: 0.1, step_max: 0.5, ..Default::default() },
            1.0,
        );
        assert_eq!(capped.status, LineSearchStatus::StepAtMaximum);
        assert_eq!(capped.status.info_code(), 5);
        assert_eq!(capped.step, 0.5);
        assert_relative_eq!(capped.fitness, -7.3125);

        // Smallest allowed step overshoots: info 4, start point returned.
        let floored = search_with(
            MoreThuenteConfig { step_min: 10.0, step_max: 1e20, ..Default::default() },
            10.0,
        );
        assert_eq!(floored.status, LineSearchStatus::StepAtMinimum);
        assert_eq!(floored.status.info_code(), 4);
        assert_eq!(floored.step, 0.0);
        assert_eq!(floored.fitness, -20.0);

        // One evaluation allowed and it overshoots: info 3 at the start point.
        let starved =
            search_with(MoreThuenteConfig { max_evaluations: 1, ..Default::default() }, 10.0);
        assert_eq!(starved.status, LineSearchStatus::MaxEvaluations);
        assert_eq!(starved.status.info_code(), 3);
        assert_eq!(starved.evaluations, 1);
        assert_eq!(starved.step, 0.0);
        assert_eq!(starved.fitness, -20.0);

        // Coarse xtol closes the bracket first: info 2, still an improvement.
        let narrow = search_with(
            MoreThuenteConfig { gtol: 1e-12, xtol: 1e-3, max_evaluations: 100, ..Default::default() },
            1.0,
        );
        assert_eq!(narrow.status, LineSearchStatus::IntervalTooSmall);
        assert_eq!(narrow.status.info_code(), 2);
        assert!(narrow.fitness > -20.0);

        assert_eq!(LineSearchStatus::RoundingErrors.info_code(), 6);
    }

    #[test]
    // Purpose
    // -------
    // Trials in an impossible region are discarded and the step shrinks
    // until a finite, acceptable point is found.
    //
    // Given
    // -----
    // - f(x) = -(x - 2)² for x < 3 and -∞ beyond, initial step 10.
    //
    // Expect
    // ------
    // - Steps 10 and 5 are rejected; 2.5 is accepted after 3 evaluations.
    fn impossible_trials_shrink_the_step() {
        let (x, f, g) = start(&Barrier);

        let result = MoreThuente::default()
            .search(&Barrier, &x, f, &g, &array![1.0], 10.0)
            .expect("search should succeed");

        assert_eq!(result.status, LineSearchStatus::Converged);
        assert_eq!(result.step, 2.5);
        assert_eq!(result.evaluations, 3);
    }

    #[test]
    fn search_never_exceeds_the_budget() {
        let objective = Counting::new(Quartic);
        let (x, f, g) = start(&Quartic);
        let ls = MoreThuente::new(MoreThuenteConfig { gtol: 1e-12, ..Default::default() })
            .expect("config should be valid");

        let result = ls
            .search_within(&objective, &x, f, &g, &array![1.0], 1.0, 3)
            .expect("search should succeed");

        assert!(result.evaluations <= 3);
        assert_eq!(objective.fitnesses(), result.evaluations);
    }

    #[test]
    // Purpose
    // -------
    // The last evaluation allowed goes to a new trial step, never back to
    // a point already evaluated.
    //
    // Given
    // -----
    // - f(x) = -(x - 2)⁴ - (x - 2)² from x = 0, initial step 1, budget 1.
    //
    // Expect
    // ------
    // - The single call evaluates x = 1 and that trial is returned.
    fn last_allowed_evaluation_tries_a_new_step() {
        let objective = Counting::new(Quartic);
        let (x, f, g) = start(&Quartic);

        let result = MoreThuente::default()
            .search_within(&objective, &x, f, &g, &array![1.0], 1.0, 1)
            .expect("search should succeed");

        assert_eq!(result.evaluations, 1);
        assert_eq!(objective.fitnesses(), 1);
        assert_eq!(result.step, 1.0);
        assert_eq!(result.fitness, -2.0);
    }

    #[test]
    fn descent_directions_and_bad_steps_are_rejected() {
        let (x, f, g) = start(&Quartic);
        let ls = MoreThuente::default();

        assert!(matches!(
            ls.search(&Quartic, &x, f, &g, &array![-1.0], 1.0),
            Err(OptError::NotAscentDirection { .. })
        ));
        assert!(matches!(
            ls.search(&Quartic, &x, f, &g, &array![1.0], 0.0),
            Err(OptError::InvalidLineSearchStep { .. })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad = [
            MoreThuenteConfig { ftol: 0.0, ..Default::default() },
            MoreThuenteConfig { gtol: 1.0, ..Default::default() },
            MoreThuenteConfig { xtol: -1.0, ..Default::default() },
            MoreThuenteConfig { step_min: 2.0, step_max: 1.0, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(
                MoreThuente::new(config),
                Err(OptError::InvalidHyperparameter { .. })
            ));
        }
        assert!(MoreThuente::new(MoreThuenteConfig { max_evaluations: 0, ..Default::default() })
            .is_err());
    }
}
