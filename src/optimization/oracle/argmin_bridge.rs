//! Adapter that exposes a `FlatObjective` as an `argmin` problem.
//!
//! We convert a *maximization* of a fitness `f(θ)` into a *minimization*
//! problem by defining the cost as `c(θ) = -f(θ)`; gradients are negated
//! accordingly. This is the only place in the crate where the sign flips.
//!
//! Impossible points (non-finite fitness) are mapped to the finite cost
//! [`IMPOSSIBLE_COST`] with a zero gradient, so that argmin's line searches
//! reject such trial steps and shrink instead of aborting the run.
use argmin::core::{CostFunction, Error, Gradient};

use crate::optimization::{
    errors::OptError,
    oracle::traits::FlatObjective,
    types::{Cost, Grad, Theta},
};

/// Cost reported to argmin for points with non-finite fitness.
pub const IMPOSSIBLE_COST: Cost = 1e20;

/// Bridges a [`FlatObjective`] to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone, Copy)]
pub struct ArgMinAdapter<'a, O: FlatObjective + ?Sized> {
    objective: &'a O,
}

impl<'a, O: FlatObjective + ?Sized> ArgMinAdapter<'a, O> {
    pub fn new(objective: &'a O) -> Self {
        Self { objective }
    }
}

impl<'a, O: FlatObjective + ?Sized> CostFunction for ArgMinAdapter<'a, O> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ) = -f(θ)`, or [`IMPOSSIBLE_COST`] if `f(θ)` is not finite.
    ///
    /// # Errors
    /// Propagates any `OptError` from the objective via `?`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let fitness = self.objective.fitness(theta)?;
        if !fitness.is_finite() {
            return Ok(IMPOSSIBLE_COST);
        }
        Ok(-fitness)
    }
}

impl<'a, O: FlatObjective + ?Sized> Gradient for ArgMinAdapter<'a, O> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇c(θ) = -∇f(θ)`.
    ///
    /// A gradient rejected for non-finite entries is replaced by zeros when
    /// the fitness at `θ` is itself impossible; otherwise the error stands.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.objective.gradient(theta) {
            Ok(g) => Ok(g.mapv(|v| if v.is_finite() { -v } else { 0.0 })),
            Err(OptError::InvalidGradient { index, value, reason }) => {
                if self.objective.fitness(theta)?.is_finite() {
                    return Err(OptError::InvalidGradient { index, value, reason }.into());
                }
                Ok(Grad::zeros(theta.len()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{errors::OptResult, types::Fitness};
    use ndarray::array;

    /// f(x) = ln(x0) - x1², impossible for x0 <= 0.
    struct LogBarrier;

    impl FlatObjective for LogBarrier {
        fn dim(&self) -> usize {
            2
        }

        fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
            if theta[0] <= 0.0 {
                return Ok(f64::NEG_INFINITY);
            }
            Ok(theta[0].ln() - theta[1] * theta[1])
        }

        fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
            if theta[0] <= 0.0 {
                return Err(OptError::InvalidGradient {
                    index: 0,
                    value: f64::NAN,
                    reason: "Gradient elements must be finite.",
                });
            }
            Ok(array![1.0 / theta[0], -2.0 * theta[1]])
        }
    }

    #[test]
    // Purpose
    // -------
    // Cost and gradient are the negated fitness and fitness gradient.
    fn cost_and_gradient_are_negated() {
        let problem = ArgMinAdapter::new(&LogBarrier);
        let theta = array![1.0, 2.0];

        let cost = problem.cost(&theta).expect("cost should succeed");
        let grad = problem.gradient(&theta).expect("gradient should succeed");

        assert_eq!(cost, 4.0);
        assert_eq!(grad, array![-1.0, 4.0]);
    }

    #[test]
    // Purpose
    // -------
    // Impossible points become a large finite cost with a zero gradient.
    fn impossible_points_map_to_capped_cost() {
        let problem = ArgMinAdapter::new(&LogBarrier);
        let theta = array![-1.0, 0.0];

        assert_eq!(problem.cost(&theta).expect("cost should succeed"), IMPOSSIBLE_COST);
        assert_eq!(problem.gradient(&theta).expect("gradient should succeed"), array![0.0, 0.0]);
    }
}
