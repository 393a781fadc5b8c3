//! Immutable result of an optimizer run, expressed in named variables.
use crate::optimization::{
    algorithms::{FlatOutcome, Termination},
    errors::{OptError, OptResult},
    types::Fitness,
    variables::{Tensor, VariableId, VariableValues},
};

/// Optimized point, its fitness and run diagnostics.
///
/// A result is produced whether or not a convergence criterion was met;
/// check [`OptimizedResult::converged`] or call
/// [`OptimizedResult::require_converged`] to reject budget-limited runs.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedResult {
    point: VariableValues,
    fitness: Fitness,
    termination: Termination,
    iterations: usize,
    evaluations: usize,
    trace: Vec<Fitness>,
}

impl OptimizedResult {
    pub(crate) fn new(point: VariableValues, outcome: FlatOutcome) -> Self {
        let FlatOutcome { fitness, termination, iterations, evaluations, trace, .. } = outcome;
        Self { point, fitness, termination, iterations, evaluations, trace }
    }

    /// Optimized value of every latent variable, in the original shapes.
    pub fn point(&self) -> &VariableValues {
        &self.point
    }

    /// # Errors
    /// Returns [`OptError::UnknownVariable`] if `id` was not optimized.
    pub fn value_of(&self, id: VariableId) -> OptResult<&Tensor> {
        self.point.get(&id).ok_or(OptError::UnknownVariable { id: id.raw() })
    }

    /// Fitness (log-probability or log-likelihood) at [`Self::point`].
    pub fn fitness(&self) -> Fitness {
        self.fitness
    }

    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    pub fn converged(&self) -> bool {
        self.termination.is_converged()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Fitness at each accepted iterate; empty for Adam.
    pub fn fitness_trace(&self) -> &[Fitness] {
        &self.trace
    }

    pub fn into_point(self) -> VariableValues {
        self.point
    }

    /// Keep the result only if a convergence criterion was met.
    ///
    /// # Errors
    /// Returns [`OptError::NotConverged`] with the termination reason and
    /// the number of evaluations spent.
    pub fn require_converged(self) -> OptResult<Self> {
        if self.converged() {
            Ok(self)
        } else {
            Err(OptError::NotConverged {
                termination: self.termination,
                evaluations: self.evaluations,
            })
        }
    }
}
