//! optimization::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the flat numeric types and the argmin solver aliases used by
//! every layer of the optimizer, so the rest of the code stays agnostic to
//! `ndarray` and argmin generics.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for flat parameter vectors, gradients,
//!   fitness values and argmin costs (`Theta`, `Grad`, `Fitness`, `Cost`).
//! - Expose the More–Thuente line search and nonlinear conjugate-gradient
//!   solver aliases wired to `(Theta, Grad, Cost)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All flat vectors are `ndarray::Array1<f64>`; their length equals the
//!   total element count of the latent layout they were produced from.
//! - `Fitness` is always maximized. `Cost` only exists at the argmin
//!   boundary, where `Cost = -Fitness`.
//!
//! Testing notes
//! -------------
//! - This module only defines type aliases and constants; correctness is
//!   exercised by the modules that instantiate them.
use argmin::solver::{conjugategradient::NonlinearConjugateGradient, linesearch::MoreThuenteLineSearch};
use ndarray::Array1;

/// Flat parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Flat gradient vector, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Scalar fitness (log-probability or log-likelihood). Maximized.
pub type Fitness = f64;

/// Scalar argmin cost `c(θ) = -fitness(θ)`. Minimized.
pub type Cost = f64;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_HISTORY: usize = 7;

/// Default cap on fitness/gradient evaluations for every algorithm.
pub const DEFAULT_MAX_EVALUATIONS: usize = 10_000;

/// Largest absolute gradient component treated as "flat" at the start.
pub const FLAT_GRADIENT: f64 = 1e-16;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// Nonlinear conjugate gradient wired to the More–Thuente line search.
pub type NcgMoreThuente<B> = NonlinearConjugateGradient<Theta, MoreThuenteLS, B, Cost>;
