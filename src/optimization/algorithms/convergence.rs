//! Convergence checkers shared by the algorithms.
//!
//! - [`ConvergenceChecker`] compares successive points `θ` and `θ_next`
//!   under a chosen [`Norm`], either relative to the size of the points or
//!   in absolute terms (used by Adam).
//! - [`ValueChecker`] compares successive fitness values with relative and
//!   absolute thresholds (used by conjugate gradient and L-BFGS).
use std::str::FromStr;

use argmin_math::ArgminL2Norm;

use crate::optimization::{
    errors::{OptError, OptResult},
    types::Theta,
    validation::verify_positive,
};

/// Vector norm used by [`ConvergenceChecker`].
///
/// Parsing accepts case-insensitive `"L2"` and `"MaxAbs"` (or `"max_abs"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Norm {
    #[default]
    L2,
    MaxAbs,
}

impl Norm {
    pub fn of(&self, v: &Theta) -> f64 {
        match self {
            Norm::L2 => v.l2_norm(),
            Norm::MaxAbs => v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs())),
        }
    }
}

impl FromStr for Norm {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "").as_str() {
            "l2" => Ok(Norm::L2),
            "maxabs" => Ok(Norm::MaxAbs),
            _ => Err(OptError::InvalidNorm {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'L2' or 'MaxAbs'.",
            }),
        }
    }
}

/// Whether a threshold is scaled by the size of the compared points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Relative,
    Absolute,
}

/// Point-based convergence test.
///
/// - Relative: `‖θ_next − θ‖ ≤ threshold · max(‖θ‖, ‖θ_next‖)`.
/// - Absolute: `‖θ_next − θ‖ ≤ threshold`.
///
/// Default: relative, L2 norm, threshold `1e-6`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceChecker {
    mode: CheckMode,
    norm: Norm,
    threshold: f64,
}

impl ConvergenceChecker {
    /// # Errors
    /// Returns [`OptError::InvalidHyperparameter`] unless `threshold` is
    /// finite and positive.
    pub fn relative(norm: Norm, threshold: f64) -> OptResult<Self> {
        verify_positive("convergence_threshold", threshold)?;
        Ok(Self { mode: CheckMode::Relative, norm, threshold })
    }

    /// # Errors
    /// Returns [`OptError::InvalidHyperparameter`] unless `threshold` is
    /// finite and positive.
    pub fn absolute(norm: Norm, threshold: f64) -> OptResult<Self> {
        verify_positive("convergence_threshold", threshold)?;
        Ok(Self { mode: CheckMode::Absolute, norm, threshold })
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn has_converged(&self, theta: &Theta, theta_next: &Theta) -> bool {
        let delta = self.norm.of(&(theta_next - theta));
        match self.mode {
            CheckMode::Absolute => delta <= self.threshold,
            CheckMode::Relative => {
                let scale = self.norm.of(theta).max(self.norm.of(theta_next));
                delta <= self.threshold * scale
            }
        }
    }
}

impl Default for ConvergenceChecker {
    fn default() -> Self {
        Self { mode: CheckMode::Relative, norm: Norm::L2, threshold: 1e-6 }
    }
}

/// Fitness-based convergence test.
///
/// Converged when `|f_k − f_{k−1}| ≤ relative · max(|f_k|, |f_{k−1}|)` or
/// `|f_k − f_{k−1}| ≤ absolute`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChecker {
    relative: f64,
    absolute: f64,
}

impl ValueChecker {
    /// # Errors
    /// Returns [`OptError::InvalidHyperparameter`] unless both thresholds are
    /// finite and positive.
    pub fn new(relative: f64, absolute: f64) -> OptResult<Self> {
        verify_positive("relative_threshold", relative)?;
        verify_positive("absolute_threshold", absolute)?;
        Ok(Self { relative, absolute })
    }

    pub fn relative(&self) -> f64 {
        self.relative
    }

    pub fn absolute(&self) -> f64 {
        self.absolute
    }

    pub fn has_converged(&self, previous: f64, current: f64) -> bool {
        let diff = (current - previous).abs();
        let size = previous.abs().max(current.abs());
        diff <= self.relative * size || diff <= self.absolute
    }
}

impl Default for ValueChecker {
    fn default() -> Self {
        Self { relative: 1e-8, absolute: 1e-8 }
    }
}
