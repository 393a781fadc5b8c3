//! latent_optim — gradient-based MAP and MLE for probabilistic models.
//!
//! Purpose
//! -------
//! Find the values of a model's latent variables that maximize its
//! log-probability (MAP) or log-likelihood (MLE). Variables are named,
//! tensor-shaped and may be bounded; the optimizer flattens them, runs one
//! of Adam, nonlinear conjugate gradient or L-BFGS, and returns the
//! optimized tensors.
//!
//! Key behaviors
//! -------------
//! - Implement [`optimization::oracle::ProbabilisticModel`] for a model.
//! - Build a [`optimization::optimizer::GradientOptimizer`] and call
//!   `max_a_posteriori()` or `max_likelihood()`.
//! - Inspect the [`optimization::optimizer::OptimizedResult`].
//!
//! Conventions
//! -----------
//! - Errors are reported as [`optimization::errors::OptError`]; the crate
//!   does not panic on bad input.
//! - Diagnostics go through the `log` facade. With the `obs_slog` feature,
//!   argmin's slog observer can report conjugate-gradient iterations.
//!
//! Downstream usage
//! ----------------
//! Most callers only need `use latent_optim::optimization::prelude::*;`.

pub mod optimization;
