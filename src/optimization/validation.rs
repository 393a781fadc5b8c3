//! Validation helpers for optimizer configuration and outputs.
//!
//! This module centralizes the consistency checks used across the
//! optimizer interface:
//!
//! - **Hyperparameter checks**: [`verify_positive`], [`verify_unit_interval`]
//!   and [`verify_max_evaluations`] reject invalid configuration at
//!   construction time. Nothing is silently clamped.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values.
//! - **Fitness values**: [`validate_fitness`] checks a final fitness for
//!   finiteness.
//! - **Starting point**: [`verify_start_fitness`] and
//!   [`verify_start_gradient`] reject starts no algorithm can move away
//!   from. Algorithms call the fitness check before evaluating any gradient.
use crate::optimization::{
    errors::{OptError, OptResult},
    types::{Fitness, Grad, Theta, FLAT_GRADIENT},
};

/// Validate a hyperparameter that must be finite and strictly positive.
///
/// # Errors
/// Returns [`OptError::InvalidHyperparameter`] naming `name` if the value is
/// non-finite or ≤ 0.0.
pub fn verify_positive(name: &'static str, value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidHyperparameter {
            name,
            value,
            reason: "Value must be finite.",
        });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidHyperparameter {
            name,
            value,
            reason: "Value must be positive.",
        });
    }
    Ok(())
}

/// Validate a decay rate that must lie in `[0, 1)`.
///
/// # Errors
/// Returns [`OptError::InvalidHyperparameter`] if `value` is NaN, negative
/// or ≥ 1.
pub fn verify_unit_interval(name: &'static str, value: f64) -> OptResult<()> {
    if !(0.0..1.0).contains(&value) {
        return Err(OptError::InvalidHyperparameter {
            name,
            value,
            reason: "Value must lie in [0, 1).",
        });
    }
    Ok(())
}

/// Validate an evaluation budget.
///
/// # Errors
/// Returns [`OptError::InvalidMaxEvaluations`] if `max_evaluations == 0`.
pub fn verify_max_evaluations(max_evaluations: usize) -> OptResult<()> {
    if max_evaluations == 0 {
        return Err(OptError::InvalidMaxEvaluations {
            max_evaluations,
            reason: "Maximum evaluations must be greater than zero.",
        });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a final fitness value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteFitness`] if the value is `NaN` or infinite.
pub fn validate_fitness(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteFitness { value });
    }
    Ok(())
}

/// Reject a starting point whose fitness marks it impossible.
///
/// Parameters
/// ----------
/// - `fitness`: fitness at the starting point.
///
/// Errors
/// ------
/// - [`OptError::ImpossibleStartingPoint`] if `fitness` is `NaN` or infinite
///   (a zero-probability start reports `-∞`).
pub fn verify_start_fitness(fitness: Fitness) -> OptResult<()> {
    if !fitness.is_finite() {
        return Err(OptError::ImpossibleStartingPoint { fitness });
    }
    Ok(())
}

/// Reject a starting gradient with no usable direction.
///
/// Parameters
/// ----------
/// - `gradient`: gradient at the starting point.
///
/// Errors
/// ------
/// - [`OptError::FlatGradient`] if the largest absolute component is
///   ≤ [`FLAT_GRADIENT`], carrying that component.
pub fn verify_start_gradient(gradient: &Grad) -> OptResult<()> {
    let max_abs = gradient.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
    if max_abs <= FLAT_GRADIENT {
        return Err(OptError::FlatGradient { max_abs });
    }
    Ok(())
}
