//! errors — unified error surface for the optimization layer.
//!
//! Every fallible operation in the crate returns [`OptResult<T>`]. Backend
//! (`argmin`) failures are converted into [`OptError`] through the
//! `From<argmin::core::Error>` impl, which first tries to recover an
//! `OptError` that was raised inside one of our own cost/gradient adapters
//! before falling back to the argmin error kinds.
use argmin::core::{ArgminError, Error};
use thiserror::Error;

use crate::optimization::algorithms::Termination;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptError {
    // ---- Configuration ----
    /// Evaluation budgets must allow at least one evaluation.
    #[error("Invalid maximum evaluations {max_evaluations}: {reason}")]
    InvalidMaxEvaluations { max_evaluations: usize, reason: &'static str },

    /// A numeric hyperparameter is outside its admissible range.
    #[error("Invalid hyperparameter '{name}' = {value}: {reason}")]
    InvalidHyperparameter { name: &'static str, value: f64, reason: &'static str },

    /// L-BFGS history size needs to be at least 1.
    #[error("Invalid L-BFGS history size {size}: {reason}")]
    InvalidHistorySize { size: usize, reason: &'static str },

    /// Unknown conjugate-gradient update formula name.
    #[error("Invalid update formula '{name}': {reason}")]
    InvalidUpdateFormula { name: String, reason: &'static str },

    /// Unknown norm name for the convergence checker.
    #[error("Invalid norm '{name}': {reason}")]
    InvalidNorm { name: String, reason: &'static str },

    /// Reparameterization bounds must be finite with lower < upper.
    #[error("Invalid bound [{lower}, {upper}]: {reason}")]
    InvalidBound { lower: f64, upper: f64, reason: &'static str },

    // ---- Variables ----
    /// The model exposes no latent variables to optimize.
    #[error("Cannot optimize a model with no latent variables")]
    NoLatentVariables,

    /// The same variable id appears twice in the latent list.
    #[error("Variable {id} appears more than once in the latent variable list")]
    DuplicateVariable { id: u64 },

    /// A variable id is not part of the latent layout.
    #[error("Variable {id} is not a latent variable of this model")]
    UnknownVariable { id: u64 },

    /// A value map is missing one of the latent variables.
    #[error("Missing value for latent variable {id}")]
    MissingVariableValue { id: u64 },

    /// A tensor's shape differs from the one captured in the layout.
    #[error("Shape mismatch for variable {id}: expected {expected:?}, found {found:?}")]
    ShapeMismatch { id: u64, expected: Vec<usize>, found: Vec<usize> },

    /// A flat vector has the wrong total length.
    #[error("Flat vector length mismatch: expected {expected}, found {found}")]
    FlatLengthMismatch { expected: usize, found: usize },

    /// A starting value lies on or outside its reparameterization bound.
    #[error("Start value {value} of variable {id} lies outside its bound: {reason}")]
    StartOutsideBounds { id: u64, value: f64, reason: &'static str },

    // ---- Oracle ----
    /// Implies that finite differences should be used.
    #[error("Gradient not implemented")]
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite.
    #[error("Invalid gradient at index {index}: {value}: {reason}")]
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    /// Failure reported by the model while evaluating fitness or gradient.
    #[error("Model evaluation failed: {text}")]
    ModelError { text: String },

    // ---- Start conditions ----
    /// The starting point has zero probability (non-finite fitness).
    #[error("Cannot start optimizer on zero probability network (fitness = {fitness})")]
    ImpossibleStartingPoint { fitness: f64 },

    /// Every gradient component at the start is numerically zero.
    #[error("Cannot start optimizer on a flat gradient (max |g| = {max_abs})")]
    FlatGradient { max_abs: f64 },

    // ---- Line search ----
    /// The search direction does not increase the fitness.
    #[error("Search direction is not an ascent direction (slope = {slope})")]
    NotAscentDirection { slope: f64 },

    /// An initial line-search step must be positive and finite.
    #[error("Invalid line search step {step}: {reason}")]
    InvalidLineSearchStep { step: f64, reason: &'static str },

    // ---- Optimizer outcome ----
    /// The run stopped without meeting a convergence criterion.
    #[error("Optimizer did not converge ({termination}) after {evaluations} evaluations")]
    NotConverged { termination: Termination, evaluations: usize },

    /// Estimated parameters must be finite.
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing.
    #[error("Missing estimated parameters (theta hat)")]
    MissingThetaHat,

    /// The final fitness of a run is not finite.
    #[error("Non-finite fitness value: {value}")]
    NonFiniteFitness { value: f64 },

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    #[error("Not implemented: {text}")]
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    #[error("Not initialized: {text}")]
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },
    /// Wrapper for argmin::PotentialBug
    #[error("Potential bug: {text}")]
    PotentialBug { text: String },
    /// Wrapper for other argmin::Error types
    #[error("Backend error: {text}")]
    BackendError { text: String },

    // ---- Fallback ----
    #[error("Unknown error")]
    UnknownError,
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // An `OptError` raised inside a cost/gradient adapter travels through
    // argmin as `argmin::core::Error`; converting back must recover it.
    //
    // Expect
    // ------
    // - The original variant, not a `BackendError` wrapper.
    fn from_argmin_error_recovers_inner_opt_error() {
        // Arrange
        let inner = OptError::ImpossibleStartingPoint { fitness: f64::NEG_INFINITY };
        let wrapped: Error = inner.clone().into();

        // Act
        let recovered = OptError::from(wrapped);

        // Assert
        assert_eq!(recovered, inner);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map onto the dedicated wrapper variants.
    fn from_argmin_error_maps_argmin_kinds() {
        let wrapped: Error = ArgminError::InvalidParameter { text: "bad".to_string() }.into();

        let mapped = OptError::from(wrapped);

        assert_eq!(mapped, OptError::InvalidParameter { text: "bad".to_string() });
    }

    #[test]
    fn display_mentions_zero_probability_start() {
        let err = OptError::ImpossibleStartingPoint { fitness: f64::NEG_INFINITY };

        assert!(err.to_string().contains("zero probability"));
    }
}
