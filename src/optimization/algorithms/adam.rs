//! Adam — first-order adaptive-moment ascent.
//!
//! Purpose
//! -------
//! Maximize a flat objective using only gradients, with per-element step
//! sizes adapted from exponentially decayed first and second moments.
//!
//! Key behaviors
//! -------------
//! Starting from `m = v = 0` and `t = 1`, every iteration
//! 1. evaluates `g = ∇f(θ)`,
//! 2. updates `m ← β1·m + (1 − β1)·g` and `v ← β2·v + (1 − β2)·g²`,
//! 3. computes the bias correction `b = (1 − β1^t) / sqrt(1 − β2^t)`,
//! 4. steps `θ_next = θ + α·m / (sqrt(v)·b + ε)`,
//! 5. tests `(θ, θ_next)` with the convergence checker, then swaps.
//!
//! Invariants & assumptions
//! ------------------------
//! - The evaluation budget counts gradient evaluations; the fitness
//!   evaluation at the returned point is reported but not budgeted, and
//!   neither is the start check.
//! - An impossible start fails with `ImpossibleStartingPoint` before the
//!   first gradient. Impossible points are not detected inside the loop;
//!   Adam only follows gradients.
use log::{debug, info};
use ndarray::Zip;

use crate::optimization::{
    algorithms::{
        convergence::ConvergenceChecker,
        outcome::{FlatOutcome, Termination},
        GradientOptimizationAlgorithm,
    },
    errors::OptResult,
    oracle::FlatObjective,
    types::{Theta, DEFAULT_MAX_EVALUATIONS},
    validation::{
        verify_max_evaluations, verify_positive, verify_start_fitness, verify_unit_interval,
    },
};

/// Adam hyperparameters.
///
/// Default: `alpha = 0.001`, `beta1 = 0.9`, `beta2 = 0.999`,
/// `epsilon = 1e-8`, `max_evaluations = 10_000`, relative L2 convergence
/// checker with threshold `1e-6`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub alpha: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub max_evaluations: usize,
    pub convergence: ConvergenceChecker,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            alpha: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            convergence: ConvergenceChecker::default(),
        }
    }
}

/// Validated Adam optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adam {
    config: AdamConfig,
}

impl Adam {
    /// # Errors
    /// - [`OptError::InvalidHyperparameter`](crate::optimization::errors::OptError::InvalidHyperparameter)
    ///   if `alpha` or `epsilon` is not finite and positive, or if `beta1`
    ///   or `beta2` lies outside `[0, 1)`.
    /// - [`OptError::InvalidMaxEvaluations`](crate::optimization::errors::OptError::InvalidMaxEvaluations)
    ///   if `max_evaluations == 0`.
    pub fn new(config: AdamConfig) -> OptResult<Self> {
        verify_positive("alpha", config.alpha)?;
        verify_positive("epsilon", config.epsilon)?;
        verify_unit_interval("beta1", config.beta1)?;
        verify_unit_interval("beta2", config.beta2)?;
        verify_max_evaluations(config.max_evaluations)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self { config: AdamConfig::default() }
    }
}

impl GradientOptimizationAlgorithm for Adam {
    fn name(&self) -> &'static str {
        "Adam"
    }

    fn optimize<O: FlatObjective + ?Sized>(
        &self, objective: &O, start: Theta,
    ) -> OptResult<FlatOutcome> {
        let AdamConfig { alpha, beta1, beta2, epsilon, max_evaluations, convergence } =
            self.config;
        verify_start_fitness(objective.fitness(&start)?)?;
        let dim = start.len();
        let mut theta = start;
        let mut theta_next = Theta::zeros(dim);
        let mut m = Theta::zeros(dim);
        let mut v = Theta::zeros(dim);
        let mut t = 0usize;
        let mut termination = Termination::EvaluationBudgetExhausted;

        while t < max_evaluations {
            t += 1;
            let g = objective.gradient(&theta)?;
            let b = (1.0 - beta1.powf(t as f64)) / (1.0 - beta2.powf(t as f64)).sqrt();
            Zip::from(&mut m)
                .and(&mut v)
                .and(&mut theta_next)
                .and(&theta)
                .and(&g)
                .for_each(|m, v, next, &th, &gi| {
                    *m = beta1 * *m + (1.0 - beta1) * gi;
                    *v = beta2 * *v + (1.0 - beta2) * gi * gi;
                    *next = th + alpha * *m / (v.sqrt() * b + epsilon);
                });
            let converged = convergence.has_converged(&theta, &theta_next);
            std::mem::swap(&mut theta, &mut theta_next);
            debug!("adam: t = {t}, |g|max = {:.3e}", g.iter().fold(0.0_f64, |a, x| a.max(x.abs())));
            if converged {
                termination = Termination::ParameterTolerance;
                break;
            }
        }

        let fitness = objective.fitness(&theta)?;
        info!("adam: {termination} after {t} iterations, fitness = {fitness:.6}");
        FlatOutcome::new(theta, fitness, termination, t, t + 1)
    }
}
