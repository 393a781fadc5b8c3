//! algorithms — gradient-based maximizers over a flat objective.
//!
//! Purpose
//! -------
//! Provide the three interchangeable optimization strategies (Adam,
//! nonlinear conjugate gradient, L-BFGS) behind one trait, plus the
//! building blocks they share: convergence checkers, the More–Thuente line
//! search and the L-BFGS history buffer.
//!
//! Key behaviors
//! -------------
//! - [`GradientOptimizationAlgorithm::optimize`] takes a [`FlatObjective`]
//!   and a starting `Theta` and returns a validated [`FlatOutcome`].
//! - [`Algorithm`] is the tagged strategy selector used by the optimizer
//!   front door; it dispatches to the wrapped algorithm.
//!
//! Invariants & assumptions
//! ------------------------
//! - All algorithms *maximize* fitness. Only the conjugate-gradient backend
//!   goes through argmin, and the sign flip is confined to the bridge.
//! - Every algorithm owns its run state in locals of `optimize`; instances
//!   are immutable after validation and can be reused across runs.
//! - Running out of evaluations is not an error: the outcome carries
//!   [`Termination::EvaluationBudgetExhausted`] and the best point held.
//!
//! Testing notes
//! -------------
//! - Each algorithm is tested against closed-form objectives from the
//!   test-only `test_objectives` module.
pub mod adam;
pub mod conjugate_gradient;
pub mod convergence;
pub mod history;
pub mod lbfgs;
pub mod line_search;
pub mod outcome;

#[cfg(test)]
pub(crate) mod test_objectives;

pub use self::adam::{Adam, AdamConfig};
pub use self::conjugate_gradient::{ConjugateGradient, ConjugateGradientConfig, UpdateFormula};
pub use self::convergence::{CheckMode, ConvergenceChecker, Norm, ValueChecker};
pub use self::lbfgs::{Lbfgs, LbfgsConfig};
pub use self::line_search::{LineSearchResult, LineSearchStatus, MoreThuente, MoreThuenteConfig};
pub use self::outcome::{FlatOutcome, Termination};

use crate::optimization::{errors::OptResult, oracle::FlatObjective, types::Theta};

/// A gradient-based maximizer.
pub trait GradientOptimizationAlgorithm {
    /// Human-readable algorithm name, used in logs.
    fn name(&self) -> &'static str;

    /// Maximize `objective` starting from `start`.
    ///
    /// # Errors
    /// Oracle errors propagate unchanged. Algorithms that need a possible
    /// starting point return
    /// [`OptError::ImpossibleStartingPoint`](crate::optimization::errors::OptError::ImpossibleStartingPoint).
    fn optimize<O: FlatObjective + ?Sized>(
        &self, objective: &O, start: Theta,
    ) -> OptResult<FlatOutcome>;
}

/// Strategy selector. Default: conjugate gradient (Polak–Ribière).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Algorithm {
    Adam(Adam),
    ConjugateGradient(ConjugateGradient),
    Lbfgs(Lbfgs),
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::ConjugateGradient(ConjugateGradient::default())
    }
}

impl GradientOptimizationAlgorithm for Algorithm {
    fn name(&self) -> &'static str {
        match self {
            Algorithm::Adam(a) => a.name(),
            Algorithm::ConjugateGradient(a) => a.name(),
            Algorithm::Lbfgs(a) => a.name(),
        }
    }

    fn optimize<O: FlatObjective + ?Sized>(
        &self, objective: &O, start: Theta,
    ) -> OptResult<FlatOutcome> {
        match self {
            Algorithm::Adam(a) => a.optimize(objective, start),
            Algorithm::ConjugateGradient(a) => a.optimize(objective, start),
            Algorithm::Lbfgs(a) => a.optimize(objective, start),
        }
    }
}

impl From<Adam> for Algorithm {
    fn from(value: Adam) -> Self {
        Algorithm::Adam(value)
    }
}

impl From<ConjugateGradient> for Algorithm {
    fn from(value: ConjugateGradient) -> Self {
        Algorithm::ConjugateGradient(value)
    }
}

impl From<Lbfgs> for Algorithm {
    fn from(value: Lbfgs) -> Self {
        Algorithm::Lbfgs(value)
    }
}
