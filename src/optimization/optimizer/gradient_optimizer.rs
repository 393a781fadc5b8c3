//! GradientOptimizer — MAP / MLE front door over a probabilistic model.
//!
//! Purpose
//! -------
//! Find the latent-variable values that maximize a model's log-probability
//! (MAP) or log-likelihood (MLE) with one of the gradient algorithms, and
//! hand the answer back as named tensors.
//!
//! Key behaviors
//! -------------
//! A run
//! 1. captures the [`LatentLayout`] from `model.latent_variables()`,
//! 2. flattens the current variable values into the starting `θ₀`,
//! 3. optionally checks the start: impossible fitness first (before any
//!    gradient is evaluated), then a numerically flat gradient,
//! 4. wraps the model in a [`ModelObjective`] and, when bounds were given,
//!    a [`ReparameterizedObjective`],
//! 5. runs the selected [`Algorithm`] and un-flattens the best point.
//!
//! Invariants & assumptions
//! ------------------------
//! - The layout is captured once per run; its order and shapes are stable
//!   for the whole run.
//! - The evaluations spent on the start checks are not part of the
//!   algorithm's budget or of `OptimizedResult::evaluations`.
//! - Budget exhaustion returns a result; see
//!   [`OptimizedResult::require_converged`].
//!
//! Downstream usage
//! ----------------
//! ```ignore
//! let result = GradientOptimizer::builder(&model)
//!     .algorithm(Lbfgs::default().into())
//!     .bound(sigma, Bound::Lower(0.0))
//!     .build()?
//!     .max_a_posteriori()?;
//! let sigma_hat = result.value_of(sigma)?;
//! ```
use log::{info, warn};

use crate::optimization::{
    algorithms::{Algorithm, GradientOptimizationAlgorithm},
    errors::OptResult,
    numerical_stability::{Bound, BoundsMap, Reparameterization, ReparameterizedObjective},
    optimizer::result::OptimizedResult,
    oracle::{
        EvaluationHandlers, FitnessKind, FlatObjective, HandlerId, ModelObjective,
        ProbabilisticModel,
    },
    types::{Fitness, Theta},
    validation::{verify_start_fitness, verify_start_gradient},
    variables::{GradientMap, LatentLayout, VariableId, VariableValues},
};

/// Configured optimizer bound to one model.
pub struct GradientOptimizer<'m, M: ProbabilisticModel + ?Sized> {
    model: &'m M,
    algorithm: Algorithm,
    check_initial_fitness_conditions: bool,
    bounds: BoundsMap,
    handlers: EvaluationHandlers,
}

impl<'m, M: ProbabilisticModel + ?Sized> GradientOptimizer<'m, M> {
    pub fn builder(model: &'m M) -> GradientOptimizerBuilder<'m, M> {
        GradientOptimizerBuilder {
            model,
            algorithm: Algorithm::default(),
            check_initial_fitness_conditions: true,
            bounds: BoundsMap::new(),
            handlers: EvaluationHandlers::new(),
        }
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Register a fitness handler after construction.
    pub fn add_fitness_handler(
        &mut self, handler: impl Fn(&VariableValues, Fitness) + 'static,
    ) -> HandlerId {
        self.handlers.add_fitness_handler(Box::new(handler))
    }

    /// Register a gradient handler after construction.
    pub fn add_gradient_handler(
        &mut self, handler: impl Fn(&VariableValues, &GradientMap) + 'static,
    ) -> HandlerId {
        self.handlers.add_gradient_handler(Box::new(handler))
    }

    /// Returns `false` if `id` is not a registered fitness handler.
    pub fn remove_fitness_handler(&mut self, id: HandlerId) -> bool {
        self.handlers.remove_fitness_handler(id)
    }

    /// Returns `false` if `id` is not a registered gradient handler.
    pub fn remove_gradient_handler(&mut self, id: HandlerId) -> bool {
        self.handlers.remove_gradient_handler(id)
    }

    /// Maximize the log joint probability of latents and observations.
    ///
    /// # Errors
    /// See [`GradientOptimizer::optimize`].
    pub fn max_a_posteriori(&self) -> OptResult<OptimizedResult> {
        self.optimize(FitnessKind::LogProb)
    }

    /// Maximize the log-likelihood of the observations.
    ///
    /// # Errors
    /// See [`GradientOptimizer::optimize`].
    pub fn max_likelihood(&self) -> OptResult<OptimizedResult> {
        self.optimize(FitnessKind::LogLikelihood)
    }

    /// Run the selected algorithm on the chosen fitness.
    ///
    /// Parameters
    /// ----------
    /// - `kind`: [`FitnessKind::LogProb`] for MAP,
    ///   [`FitnessKind::LogLikelihood`] for MLE.
    ///
    /// Returns
    /// -------
    /// - The best point found, un-flattened into the model's variables,
    ///   with its fitness and run diagnostics. A run that stops on its
    ///   evaluation budget is returned, not converted into an error.
    ///
    /// Errors
    /// ------
    /// - Layout errors (`NoLatentVariables`, `DuplicateVariable`,
    ///   `ShapeMismatch`).
    /// - `ImpossibleStartingPoint` / `FlatGradient` from the start checks.
    /// - `UnknownVariable` / `StartOutsideBounds` from the bounds.
    /// - Any oracle error raised by the model.
    pub fn optimize(&self, kind: FitnessKind) -> OptResult<OptimizedResult> {
        let variables = self.model.latent_variables();
        let layout = LatentLayout::new(&variables)?;
        let start_values: VariableValues =
            variables.into_iter().map(|variable| (variable.id, variable.value)).collect();
        let start = layout.flatten(&start_values)?;
        info!(
            "gradient optimizer: {} on {kind:?} over {} values in {} variables",
            self.algorithm.name(),
            layout.dim(),
            layout.len()
        );

        let objective = ModelObjective::new(self.model, &layout, kind, &self.handlers);
        if self.check_initial_fitness_conditions {
            check_initial_conditions(&objective, &start)?;
        }

        let reparam = Reparameterization::new(&layout, &self.bounds)?;
        let outcome = if reparam.is_identity() {
            self.algorithm.optimize(&objective, start)?
        } else {
            let z0 = reparam.to_unconstrained(&start)?;
            let bounded = ReparameterizedObjective::new(&objective, &reparam);
            let mut outcome = self.algorithm.optimize(&bounded, z0)?;
            outcome.point = reparam.to_constrained(&outcome.point);
            outcome
        };

        if !outcome.converged() {
            warn!(
                "gradient optimizer: {} stopped without converging ({}) after {} evaluations",
                self.algorithm.name(),
                outcome.termination,
                outcome.evaluations
            );
        }
        let point = layout.unflatten(&outcome.point)?;
        Ok(OptimizedResult::new(point, outcome))
    }
}

/// Fail fast on a start the algorithms cannot move away from.
///
/// The fitness is evaluated first; an impossible start is rejected before
/// any gradient evaluation.
fn check_initial_conditions<O: FlatObjective + ?Sized>(objective: &O, start: &Theta) -> OptResult<()> {
    verify_start_fitness(objective.fitness(start)?)?;
    verify_start_gradient(&objective.gradient(start)?)
}

/// Builder for [`GradientOptimizer`].
pub struct GradientOptimizerBuilder<'m, M: ProbabilisticModel + ?Sized> {
    model: &'m M,
    algorithm: Algorithm,
    check_initial_fitness_conditions: bool,
    bounds: BoundsMap,
    handlers: EvaluationHandlers,
}

impl<'m, M: ProbabilisticModel + ?Sized> GradientOptimizerBuilder<'m, M> {
    /// Default: conjugate gradient with Polak–Ribière updates.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Reject impossible starts and flat starting gradients before the
    /// algorithm runs. Default `true`.
    ///
    /// Turning this off does not disable the algorithms' own checks: every
    /// algorithm rejects an impossible start, and conjugate gradient also
    /// rejects a flat starting gradient.
    pub fn check_initial_fitness_conditions(mut self, check: bool) -> Self {
        self.check_initial_fitness_conditions = check;
        self
    }

    /// Constrain every element of `id`; replaces an earlier bound.
    pub fn bound(mut self, id: VariableId, bound: Bound) -> Self {
        self.bounds.insert(id, bound);
        self
    }

    /// Called with every point whose fitness is evaluated.
    pub fn on_fitness(mut self, handler: impl Fn(&VariableValues, Fitness) + 'static) -> Self {
        self.handlers.add_fitness_handler(Box::new(handler));
        self
    }

    /// Called with every analytic gradient the model returns.
    pub fn on_gradient(mut self, handler: impl Fn(&VariableValues, &GradientMap) + 'static) -> Self {
        self.handlers.add_gradient_handler(Box::new(handler));
        self
    }

    /// # Errors
    /// Returns
    /// [`OptError::InvalidBound`](crate::optimization::errors::OptError::InvalidBound)
    /// for a bound with non-finite or inverted limits.
    pub fn build(self) -> OptResult<GradientOptimizer<'m, M>> {
        for bound in self.bounds.values() {
            bound.validate()?;
        }
        Ok(GradientOptimizer {
            model: self.model,
            algorithm: self.algorithm,
            check_initial_fitness_conditions: self.check_initial_fitness_conditions,
            bounds: self.bounds,
            handlers: self.handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        algorithms::{Adam, AdamConfig, Termination},
        errors::OptError,
        variables::{Variable, VariableId},
    };
    use approx::assert_relative_eq;
    use std::{cell::Cell, rc::Rc};

    const X: VariableId = VariableId::new(1);

    /// log p(x) = -(x - 3)² (prior), log-likelihood = -(x + 1)², defined for
    /// x > `support`.
    struct Shifted {
        start: f64,
        support: f64,
        gradient_calls: Cell<usize>,
    }

    impl Shifted {
        fn new(start: f64) -> Self {
            Self { start, support: f64::NEG_INFINITY, gradient_calls: Cell::new(0) }
        }
    }

    impl ProbabilisticModel for Shifted {
        fn latent_variables(&self) -> Vec<Variable> {
            vec![Variable::scalar(X, self.start)]
        }

        fn fitness(&self, kind: FitnessKind, point: &VariableValues) -> OptResult<Fitness> {
            let x = point[&X].sum();
            if x <= self.support {
                return Ok(f64::NEG_INFINITY);
            }
            let center = match kind {
                FitnessKind::LogProb => 3.0,
                FitnessKind::LogLikelihood => -1.0,
            };
            Ok(-(x - center).powi(2))
        }

        fn gradient(&self, kind: FitnessKind, point: &VariableValues) -> OptResult<GradientMap> {
            self.gradient_calls.set(self.gradient_calls.get() + 1);
            let x = point[&X].sum();
            let center = match kind {
                FitnessKind::LogProb => 3.0,
                FitnessKind::LogLikelihood => -1.0,
            };
            let mut map = GradientMap::new();
            map.insert(X, ndarray::ArrayD::from_elem(ndarray::IxDyn(&[]), -2.0 * (x - center)));
            Ok(map)
        }
    }

    #[test]
    // Purpose
    // -------
    // MAP and MLE maximize different fitness kinds of the same model.
    fn map_and_mle_use_their_own_fitness() {
        let model = Shifted::new(0.5);
        let optimizer = GradientOptimizer::builder(&model).build().expect("build should succeed");

        let map = optimizer.max_a_posteriori().expect("MAP should succeed");
        let mle = optimizer.max_likelihood().expect("MLE should succeed");

        assert_relative_eq!(map.value_of(X).expect("X").sum(), 3.0, epsilon = 1e-4);
        assert_relative_eq!(mle.value_of(X).expect("X").sum(), -1.0, epsilon = 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // An impossible start is rejected before any gradient is evaluated.
    fn impossible_start_fails_before_gradient_evaluation() {
        let model = Shifted { start: -2.0, support: 0.0, gradient_calls: Cell::new(0) };
        let optimizer = GradientOptimizer::builder(&model).build().expect("build should succeed");

        let err = optimizer.max_a_posteriori().expect_err("start should be rejected");

        assert!(matches!(err, OptError::ImpossibleStartingPoint { .. }));
        assert_eq!(model.gradient_calls.get(), 0);
    }

    #[test]
    fn flat_start_gradient_is_rejected_unless_checks_are_disabled() {
        let model = Shifted::new(3.0);
        let checked = GradientOptimizer::builder(&model).build().expect("build should succeed");
        let unchecked = GradientOptimizer::builder(&model)
            .algorithm(
                Adam::new(AdamConfig { max_evaluations: 3, ..Default::default() })
                    .expect("config should be valid")
                    .into(),
            )
            .check_initial_fitness_conditions(false)
            .build()
            .expect("build should succeed");

        assert!(matches!(checked.max_a_posteriori(), Err(OptError::FlatGradient { .. })));
        let result = unchecked.max_a_posteriori().expect("run should succeed");
        assert_eq!(result.value_of(X).expect("X").sum(), 3.0);
        assert_eq!(*result.termination(), Termination::ParameterTolerance);
    }

    #[test]
    // Purpose
    // -------
    // Handlers registered on a built optimizer can be removed again.
    fn handlers_can_be_added_and_removed_after_build() {
        let model = Shifted::new(0.5);
        let mut optimizer =
            GradientOptimizer::builder(&model).build().expect("build should succeed");
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let id = optimizer.add_fitness_handler(move |_, _| counter.set(counter.get() + 1));

        optimizer.max_a_posteriori().expect("MAP should succeed");
        let after_first_run = calls.get();
        assert!(optimizer.remove_fitness_handler(id));
        optimizer.max_a_posteriori().expect("MAP should succeed");

        assert!(after_first_run > 0);
        assert_eq!(calls.get(), after_first_run);
        assert!(!optimizer.remove_fitness_handler(id));
    }

    #[test]
    fn build_rejects_invalid_bounds() {
        let model = Shifted::new(0.5);

        let result = GradientOptimizer::builder(&model)
            .bound(X, Bound::Interval { lower: 1.0, upper: 1.0 })
            .build();

        assert!(matches!(result, Err(OptError::InvalidBound { .. })));
    }
}
