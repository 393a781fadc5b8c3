//! Outcome of one algorithm run over a flat objective.
//!
//! - [`Termination`]: why the run stopped. The first three variants mean a
//!   convergence criterion was met; the rest mean the run stopped early and
//!   the returned point is only the best one seen.
//! - [`FlatOutcome`]: validated final point, fitness and counters, before
//!   the optimizer front door maps it back to named variables.
use std::fmt;

use crate::optimization::{
    algorithms::line_search::LineSearchStatus,
    errors::OptResult,
    types::{Fitness, Theta},
    validation::{validate_fitness, validate_theta_hat},
};

/// Reason an algorithm stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// Gradient max-abs norm fell to the gradient tolerance.
    GradientTolerance,
    /// Successive fitness values met the value checker.
    ValueTolerance,
    /// Successive points met the parameter convergence checker.
    ParameterTolerance,
    /// The evaluation budget ran out first.
    EvaluationBudgetExhausted,
    /// A line search failed without improving the fitness.
    LineSearchFailed { status: LineSearchStatus },
    /// Backend-specific stop reason.
    Stopped { reason: String },
}

impl Termination {
    /// `true` if a convergence criterion was met.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            Termination::GradientTolerance
                | Termination::ValueTolerance
                | Termination::ParameterTolerance
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::GradientTolerance => write!(f, "gradient tolerance reached"),
            Termination::ValueTolerance => write!(f, "fitness change below tolerance"),
            Termination::ParameterTolerance => write!(f, "parameter change below tolerance"),
            Termination::EvaluationBudgetExhausted => write!(f, "evaluation budget exhausted"),
            Termination::LineSearchFailed { status } => write!(f, "line search failed: {status}"),
            Termination::Stopped { reason } => write!(f, "stopped: {reason}"),
        }
    }
}

/// Result of an algorithm run, in flat space.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatOutcome {
    pub point: Theta,
    pub fitness: Fitness,
    pub termination: Termination,
    pub iterations: usize,
    pub evaluations: usize,
    /// Fitness at each accepted iterate, starting point first. Empty for
    /// algorithms that never evaluate fitness inside their loop (Adam).
    pub trace: Vec<Fitness>,
}

impl FlatOutcome {
    /// Build a validated outcome.
    ///
    /// # Errors
    /// - [`OptError::InvalidThetaHat`](crate::optimization::errors::OptError::InvalidThetaHat)
    ///   if the point has non-finite entries.
    /// - [`OptError::NonFiniteFitness`](crate::optimization::errors::OptError::NonFiniteFitness)
    ///   if the fitness is not finite.
    pub fn new(
        point: Theta, fitness: Fitness, termination: Termination, iterations: usize,
        evaluations: usize,
    ) -> OptResult<Self> {
        let point = validate_theta_hat(Some(point))?;
        validate_fitness(fitness)?;
        Ok(Self { point, fitness, termination, iterations, evaluations, trace: Vec::new() })
    }

    pub fn with_trace(mut self, trace: Vec<Fitness>) -> Self {
        self.trace = trace;
        self
    }

    pub fn converged(&self) -> bool {
        self.termination.is_converged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use ndarray::array;

    #[test]
    fn only_tolerance_terminations_count_as_converged() {
        assert!(Termination::GradientTolerance.is_converged());
        assert!(Termination::ValueTolerance.is_converged());
        assert!(Termination::ParameterTolerance.is_converged());
        assert!(!Termination::EvaluationBudgetExhausted.is_converged());
        assert!(!Termination::LineSearchFailed { status: LineSearchStatus::RoundingErrors }
            .is_converged());
        assert!(!Termination::Stopped { reason: "x".into() }.is_converged());
    }

    #[test]
    fn new_rejects_non_finite_points_and_fitness() {
        let bad_point =
            FlatOutcome::new(array![f64::NAN], 0.0, Termination::ValueTolerance, 1, 1);
        let bad_fitness =
            FlatOutcome::new(array![0.0], f64::NEG_INFINITY, Termination::ValueTolerance, 1, 1);

        assert!(matches!(bad_point, Err(OptError::InvalidThetaHat { index: 0, .. })));
        assert!(matches!(bad_fitness, Err(OptError::NonFiniteFitness { .. })));
    }
}
