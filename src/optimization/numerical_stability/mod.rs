//! numerical_stability — robust scalar transforms and bounded-variable
//! reparameterization.
//!
//! Purpose
//! -------
//! Collect the overflow-safe scalar bijections and the reparameterization
//! layer built on them, so that unconstrained algorithms can optimize
//! variables with interval or half-line constraints.
//!
//! Key behaviors
//! -------------
//! - Provide stable scalar transforms (`safe_softplus`, its inverse,
//!   `safe_logistic`, `safe_logit`).
//! - Provide `Bound`, `Reparameterization` and `ReparameterizedObjective`,
//!   which maps a flat objective over `x` into one over unconstrained `z`
//!   with chain-rule gradients.
//!
//! Invariants & assumptions
//! ------------------------
//! - Scalar transforms assume finite `f64` inputs; domain checks (e.g., a
//!   start value strictly inside its bound) live in `Reparameterization`.
//! - The transforms never log, perform I/O, or touch global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas
//!   on safe grids and well-behaved tails.
//! - Unit tests in [`reparameterization`] cover round trips, Jacobians
//!   against finite differences, and error reporting; end-to-end bounded
//!   optimization is covered by the integration tests.

pub mod reparameterization;
pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::reparameterization::{
    Bound, BoundsMap, Reparameterization, ReparameterizedObjective,
};
pub use self::transformations::{safe_logistic, safe_logit, safe_softplus, safe_softplus_inv};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::reparameterization::{Bound, BoundsMap};
    pub use super::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    };
}
