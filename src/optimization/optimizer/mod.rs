//! optimizer — the MAP / MLE front door and its result type.
//!
//! - [`gradient_optimizer`]: `GradientOptimizer` and its builder; wires the
//!   model, layout, start checks, reparameterization and algorithm together.
//! - [`result`]: `OptimizedResult`, the immutable answer in named variables.
pub mod gradient_optimizer;
pub mod result;

pub use self::gradient_optimizer::{GradientOptimizer, GradientOptimizerBuilder};
pub use self::result::OptimizedResult;
