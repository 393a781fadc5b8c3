//! oracle — fitness/gradient oracles over flat parameter vectors.
//!
//! Purpose
//! -------
//! Turn a user model that speaks `VariableId → Tensor` into the flat
//! fitness-plus-gradient oracle the algorithms need, and expose that oracle
//! to argmin where an argmin solver is used.
//!
//! Key behaviors
//! -------------
//! - [`traits`]: `ProbabilisticModel` (model boundary, with `FitnessKind`
//!   selecting MAP vs MLE) and `FlatObjective` (algorithm boundary).
//! - [`adapter`]: `ModelObjective`, which un-flattens, delegates, aligns
//!   gradients, falls back to finite differences, and notifies evaluation
//!   handlers.
//! - [`finite_diff`]: central/forward finite-difference gradients.
//! - [`argmin_bridge`]: `ArgMinAdapter`, the cost = −fitness view.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fitness is maximized everywhere except inside `argmin_bridge`.
//! - A non-finite fitness marks an impossible point. It is a value, not an
//!   error; only the optimizer front door turns it into
//!   `ImpossibleStartingPoint`, and only at the starting point.
pub mod adapter;
pub mod argmin_bridge;
pub mod finite_diff;
pub mod traits;

pub use self::adapter::{
    EvaluationHandlers, FitnessHandler, GradientHandler, HandlerId, ModelObjective,
};
pub use self::argmin_bridge::{ArgMinAdapter, IMPOSSIBLE_COST};
pub use self::traits::{FitnessKind, FlatObjective, ProbabilisticModel};
