//! Oracle traits: the model boundary and the flat objective seen by the
//! algorithms.
//!
//! - [`ProbabilisticModel`]: implemented by callers. Exposes latent
//!   variables and evaluates fitness (and optionally its gradient) at a
//!   point given as `VariableId → Tensor`.
//! - [`FlatObjective`]: what every algorithm consumes. A scalar fitness and
//!   its gradient over a flat `Theta`.
//!
//! Convention: fitness is *maximized*. Gradients are `∂fitness/∂θ`.
use crate::optimization::{
    errors::{OptError, OptResult},
    types::{Fitness, Grad, Theta},
    variables::{GradientMap, Variable, VariableValues},
};

/// Which scalar a model should report as fitness.
///
/// - `LogProb`: log joint probability of latents and observations (MAP).
/// - `LogLikelihood`: log-likelihood of the observations only (MLE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitnessKind {
    LogProb,
    LogLikelihood,
}

/// User-implemented probabilistic model interface.
///
/// Required:
/// - `latent_variables() -> Vec<Variable>`: the variables to optimize, in a
///   stable order, with their current (starting) values.
/// - `fitness(kind, point) -> OptResult<Fitness>`: the log-probability or
///   log-likelihood at `point`. An impossible point is reported as `-∞`
///   (or any non-finite value), not as an error.
///
/// Optional:
/// - `gradient(kind, point) -> OptResult<GradientMap>`: `∂fitness/∂v` for the
///   latent variables. Variables without an entry are treated as having a
///   zero gradient. If not implemented, finite differences are used.
/// - `fitness_and_gradient(kind, point)`: a combined evaluation for models
///   that can share work between the two.
pub trait ProbabilisticModel {
    // Required methods
    fn latent_variables(&self) -> Vec<Variable>;
    fn fitness(&self, kind: FitnessKind, point: &VariableValues) -> OptResult<Fitness>;

    // Optional methods
    fn gradient(&self, _kind: FitnessKind, _point: &VariableValues) -> OptResult<GradientMap> {
        Err(OptError::GradientNotImplemented)
    }

    fn fitness_and_gradient(
        &self, kind: FitnessKind, point: &VariableValues,
    ) -> OptResult<(Fitness, GradientMap)> {
        let fitness = self.fitness(kind, point)?;
        let gradient = self.gradient(kind, point)?;
        Ok((fitness, gradient))
    }
}

/// Scalar fitness and gradient over a flat parameter vector.
///
/// Implementations must return gradients of length `dim()`. Fitness may be
/// non-finite (impossible point); algorithms treat that as a rejected trial.
pub trait FlatObjective {
    fn dim(&self) -> usize;
    fn fitness(&self, theta: &Theta) -> OptResult<Fitness>;
    fn gradient(&self, theta: &Theta) -> OptResult<Grad>;

    fn fitness_and_gradient(&self, theta: &Theta) -> OptResult<(Fitness, Grad)> {
        let fitness = self.fitness(theta)?;
        let gradient = self.gradient(theta)?;
        Ok((fitness, gradient))
    }
}

impl<T: FlatObjective + ?Sized> FlatObjective for &T {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        (**self).fitness(theta)
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        (**self).gradient(theta)
    }

    fn fitness_and_gradient(&self, theta: &Theta) -> OptResult<(Fitness, Grad)> {
        (**self).fitness_and_gradient(theta)
    }
}
