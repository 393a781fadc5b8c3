//! Adapter that exposes a user `ProbabilisticModel` as a `FlatObjective`.
//!
//! The adapter owns nothing but references: the model, the layout captured
//! at the start of the run, the fitness kind (MAP or MLE), and the caller's
//! evaluation handlers. Each call un-flattens `θ`, delegates to the model,
//! and re-aligns gradients into layout order (zero-filling variables the
//! model reports no gradient for). If the model does not implement a
//! gradient, a finite-difference gradient of the flat fitness is used.
//!
//! Once the model has answered `GradientNotImplemented` the adapter stops
//! asking: later gradients go straight to finite differences, and combined
//! evaluations call the model's fitness exactly once before differencing.
use std::{cell::Cell, fmt};

use crate::optimization::{
    errors::{OptError, OptResult},
    oracle::{
        finite_diff::fd_gradient,
        traits::{FitnessKind, FlatObjective, ProbabilisticModel},
    },
    types::{Fitness, Grad, Theta},
    validation::validate_grad,
    variables::{GradientMap, LatentLayout, VariableValues},
};

/// Callback invoked with every evaluated point and its fitness.
pub type FitnessHandler = Box<dyn Fn(&VariableValues, Fitness)>;

/// Callback invoked with every evaluated point and its gradient map.
pub type GradientHandler = Box<dyn Fn(&VariableValues, &GradientMap)>;

/// Token returned when a handler is registered; used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Caller-registered observers of oracle evaluations.
///
/// Gradient handlers only fire for analytic gradients; finite-difference
/// probes are reported through the fitness handlers.
#[derive(Default)]
pub struct EvaluationHandlers {
    fitness: Vec<(HandlerId, FitnessHandler)>,
    gradient: Vec<(HandlerId, GradientHandler)>,
    next_id: u64,
}

impl EvaluationHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_fitness_handler(&mut self, handler: FitnessHandler) -> HandlerId {
        let id = self.issue_id();
        self.fitness.push((id, handler));
        id
    }

    pub fn add_gradient_handler(&mut self, handler: GradientHandler) -> HandlerId {
        let id = self.issue_id();
        self.gradient.push((id, handler));
        id
    }

    /// Returns `false` if `id` is not a registered fitness handler.
    pub fn remove_fitness_handler(&mut self, id: HandlerId) -> bool {
        let before = self.fitness.len();
        self.fitness.retain(|(registered, _)| *registered != id);
        self.fitness.len() != before
    }

    /// Returns `false` if `id` is not a registered gradient handler.
    pub fn remove_gradient_handler(&mut self, id: HandlerId) -> bool {
        let before = self.gradient.len();
        self.gradient.retain(|(registered, _)| *registered != id);
        self.gradient.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty() && self.gradient.is_empty()
    }

    fn issue_id(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }

    fn on_fitness(&self, point: &VariableValues, fitness: Fitness) {
        self.fitness.iter().for_each(|(_, handler)| handler(point, fitness));
    }

    fn on_gradient(&self, point: &VariableValues, gradient: &GradientMap) {
        self.gradient.iter().for_each(|(_, handler)| handler(point, gradient));
    }
}

impl fmt::Debug for EvaluationHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationHandlers")
            .field("fitness", &self.fitness.len())
            .field("gradient", &self.gradient.len())
            .finish()
    }
}

/// Bridges a [`ProbabilisticModel`] to a [`FlatObjective`].
///
/// - `fitness(θ)` returns the model's fitness at `unflatten(θ)`.
/// - `gradient(θ)` returns the aligned model gradient, or a
///   finite-difference gradient if the model reports
///   `GradientNotImplemented`.
pub struct ModelObjective<'a, M: ProbabilisticModel + ?Sized> {
    model: &'a M,
    layout: &'a LatentLayout,
    kind: FitnessKind,
    handlers: &'a EvaluationHandlers,
    // Set once the model reports `GradientNotImplemented`.
    numeric_gradient: Cell<bool>,
}

impl<'a, M: ProbabilisticModel + ?Sized> ModelObjective<'a, M> {
    pub fn new(
        model: &'a M, layout: &'a LatentLayout, kind: FitnessKind, handlers: &'a EvaluationHandlers,
    ) -> Self {
        Self { model, layout, kind, handlers, numeric_gradient: Cell::new(false) }
    }

    pub fn kind(&self) -> FitnessKind {
        self.kind
    }

    pub fn layout(&self) -> &LatentLayout {
        self.layout
    }

    fn fitness_at(&self, point: &VariableValues) -> OptResult<Fitness> {
        let fitness = self.model.fitness(self.kind, point)?;
        self.handlers.on_fitness(point, fitness);
        Ok(fitness)
    }

    fn align(&self, point: &VariableValues, gradient: &GradientMap) -> OptResult<Grad> {
        self.handlers.on_gradient(point, gradient);
        let flat = self.layout.align_gradient(gradient)?;
        validate_grad(&flat, self.layout.dim())?;
        Ok(flat)
    }

    fn finite_difference(&self, theta: &Theta) -> OptResult<Grad> {
        fd_gradient(theta, |x| {
            let point = self.layout.unflatten(x)?;
            self.fitness_at(&point)
        })
    }

    /// Fitness at `point` followed by a numeric gradient at `theta`.
    fn fitness_then_finite_difference(
        &self, theta: &Theta, point: &VariableValues,
    ) -> OptResult<(Fitness, Grad)> {
        let fitness = self.fitness_at(point)?;
        if !fitness.is_finite() {
            return Ok((fitness, Grad::zeros(self.layout.dim())));
        }
        Ok((fitness, self.finite_difference(theta)?))
    }
}

impl<'a, M: ProbabilisticModel + ?Sized> FlatObjective for ModelObjective<'a, M> {
    fn dim(&self) -> usize {
        self.layout.dim()
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        let point = self.layout.unflatten(theta)?;
        self.fitness_at(&point)
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        if self.numeric_gradient.get() {
            return self.finite_difference(theta);
        }
        let point = self.layout.unflatten(theta)?;
        match self.model.gradient(self.kind, &point) {
            Ok(gradient) => self.align(&point, &gradient),
            Err(OptError::GradientNotImplemented) => {
                self.numeric_gradient.set(true);
                self.finite_difference(theta)
            }
            Err(e) => Err(e),
        }
    }

    /// Combined evaluation.
    ///
    /// The gradient is only validated when the fitness is finite; at an
    /// impossible point the gradient is meaningless and callers reject the
    /// trial on the fitness alone.
    ///
    /// A model without a gradient costs one extra fitness evaluation here
    /// only if no gradient was requested before; every algorithm evaluates
    /// the starting gradient first.
    fn fitness_and_gradient(&self, theta: &Theta) -> OptResult<(Fitness, Grad)> {
        let point = self.layout.unflatten(theta)?;
        if self.numeric_gradient.get() {
            return self.fitness_then_finite_difference(theta, &point);
        }
        match self.model.fitness_and_gradient(self.kind, &point) {
            Ok((fitness, gradient)) => {
                self.handlers.on_fitness(&point, fitness);
                if !fitness.is_finite() {
                    self.handlers.on_gradient(&point, &gradient);
                    let flat = self.layout.align_gradient(&gradient)?;
                    return Ok((fitness, flat));
                }
                Ok((fitness, self.align(&point, &gradient)?))
            }
            Err(OptError::GradientNotImplemented) => {
                self.numeric_gradient.set(true);
                self.fitness_then_finite_difference(theta, &point)
            }
            Err(e) => Err(e),
        }
    }
}
