//! optimization — gradient-based MAP / MLE over named latent variables.
//!
//! Purpose
//! -------
//! Maximize a probabilistic model's log-probability or log-likelihood with
//! respect to its latent variables. Callers implement
//! [`oracle::ProbabilisticModel`], pick an algorithm, and get the optimized
//! variables back in their original tensor shapes.
//!
//! Key behaviors
//! -------------
//! - `variables`: flatten named tensors into one vector and back.
//! - `oracle`: adapt a model into a flat objective, with finite-difference
//!   fallback, evaluation handlers and the argmin cost bridge.
//! - `algorithms`: Adam, nonlinear conjugate gradient and L-BFGS with a
//!   More–Thuente line search.
//! - `numerical_stability`: overflow-safe transforms and the
//!   reparameterization of bounded variables.
//! - `optimizer`: the `GradientOptimizer` front door and `OptimizedResult`.
//! - `errors`: one error enum (`OptError`) and result alias (`OptResult<T>`).
//!
//! Conventions
//! -----------
//! - Fitness is maximized everywhere. Only the argmin bridge works with a
//!   cost `c(θ) = −fitness(θ)`.
//! - A non-finite fitness marks an impossible point; it is a value, not an
//!   error, except at the start of a run.
//! - The library logs through the `log` facade and never installs a logger.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end runs over a model with
//!   scalar and matrix latents live in `tests/`.

pub mod algorithms;
pub mod errors;
pub mod numerical_stability;
pub mod optimizer;
pub mod oracle;
pub mod types;
pub mod validation;
pub mod variables;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use latent_optim::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::algorithms::{
        Adam, AdamConfig, Algorithm, ConjugateGradient, ConjugateGradientConfig,
        GradientOptimizationAlgorithm, Lbfgs, LbfgsConfig, MoreThuenteConfig, Norm, Termination,
        UpdateFormula,
    };
    pub use super::errors::{OptError, OptResult};
    pub use super::numerical_stability::prelude::*;
    pub use super::optimizer::{GradientOptimizer, OptimizedResult};
    pub use super::oracle::{FitnessKind, HandlerId, ProbabilisticModel};
    pub use super::variables::{GradientMap, Tensor, Variable, VariableId, VariableValues};
}
