//! numerical_stability::reparameterization — bounded variables as
//! unconstrained ones.
//!
//! Purpose
//! -------
//! Let unconstrained algorithms optimize variables with box or half-line
//! constraints by running them in an unconstrained space `z` and mapping
//! each element through a smooth bijection `x = T(z)`.
//!
//! Key behaviors
//! -------------
//! - [`Bound`] describes one variable's admissible set and provides
//!   `to_constrained`, `to_unconstrained` and `jacobian` (`dx/dz`).
//! - [`Reparameterization`] expands per-variable bounds into per-element
//!   bounds in layout order and maps whole flat vectors.
//! - [`ReparameterizedObjective`] evaluates an inner objective at `T(z)`
//!   and returns `∂f/∂z = ∂f/∂x · dx/dz` by the chain rule.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bounds are validated on construction: finite, with `lower < upper`.
//! - Starting values must lie strictly inside their bounds.
//! - No log-Jacobian term is added to the fitness, so the optimum in `z`
//!   maps to the optimum of the original fitness in `x`.
//!
//! Conventions
//! -----------
//! - `Interval`: `x = l + (u − l)·σ(z)`.
//! - `Lower`: `x = l + softplus(z)`.
//! - `Upper`: `x = u − softplus(−z)`.
use std::collections::HashMap;

use crate::optimization::{
    errors::{OptError, OptResult},
    numerical_stability::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    },
    oracle::FlatObjective,
    types::{Fitness, Grad, Theta},
    variables::{LatentLayout, VariableId},
};

/// Admissible set of one latent variable (applied element-wise).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Bound {
    #[default]
    Unbounded,
    Lower(f64),
    Upper(f64),
    Interval { lower: f64, upper: f64 },
}

/// Per-variable bounds supplied by the caller.
pub type BoundsMap = HashMap<VariableId, Bound>;

impl Bound {
    /// Validated `[lower, upper]` interval.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidBound`] for non-finite ends or `lower >= upper`.
    pub fn interval(lower: f64, upper: f64) -> OptResult<Self> {
        let bound = Bound::Interval { lower, upper };
        bound.validate()?;
        Ok(bound)
    }

    pub fn validate(&self) -> OptResult<()> {
        let (lower, upper, finite_ends) = match *self {
            Bound::Unbounded => return Ok(()),
            Bound::Lower(l) => (l, f64::INFINITY, l.is_finite()),
            Bound::Upper(u) => (f64::NEG_INFINITY, u, u.is_finite()),
            Bound::Interval { lower, upper } => {
                (lower, upper, lower.is_finite() && upper.is_finite())
            }
        };
        if !finite_ends {
            return Err(OptError::InvalidBound { lower, upper, reason: "Bounds must be finite." });
        }
        if lower >= upper {
            return Err(OptError::InvalidBound {
                lower,
                upper,
                reason: "Lower bound must be below upper bound.",
            });
        }
        Ok(())
    }

    /// Map an unconstrained value into the admissible set.
    pub fn to_constrained(&self, z: f64) -> f64 {
        match *self {
            Bound::Unbounded => z,
            Bound::Lower(l) => l + safe_softplus(z),
            Bound::Upper(u) => u - safe_softplus(-z),
            Bound::Interval { lower, upper } => lower + (upper - lower) * safe_logistic(z),
        }
    }

    /// Inverse of [`Bound::to_constrained`], or `None` if `x` is not strictly
    /// inside the bound.
    pub fn to_unconstrained(&self, x: f64) -> Option<f64> {
        if !x.is_finite() {
            return None;
        }
        match *self {
            Bound::Unbounded => Some(x),
            Bound::Lower(l) => (x > l).then(|| safe_softplus_inv(x - l)),
            Bound::Upper(u) => (x < u).then(|| -safe_softplus_inv(u - x)),
            Bound::Interval { lower, upper } => (x > lower && x < upper)
                .then(|| safe_logit((x - lower) / (upper - lower))),
        }
    }

    /// Derivative `dx/dz` of [`Bound::to_constrained`] at `z`.
    pub fn jacobian(&self, z: f64) -> f64 {
        match *self {
            Bound::Unbounded => 1.0,
            Bound::Lower(_) => safe_logistic(z),
            Bound::Upper(_) => safe_logistic(-z),
            Bound::Interval { lower, upper } => {
                let s = safe_logistic(z);
                (upper - lower) * s * (1.0 - s)
            }
        }
    }
}

/// Element-wise bounds expanded over a latent layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Reparameterization {
    bounds: Vec<Bound>,
    owners: Vec<VariableId>,
}

impl Reparameterization {
    /// Expand per-variable bounds into per-element bounds in layout order.
    ///
    /// # Errors
    /// - [`OptError::UnknownVariable`] if a bound names a non-latent variable.
    /// - [`OptError::InvalidBound`] for an invalid bound.
    pub fn new(layout: &LatentLayout, bounds: &BoundsMap) -> OptResult<Self> {
        let mut per_element = vec![Bound::Unbounded; layout.dim()];
        let mut owners = Vec::with_capacity(layout.dim());
        for id in layout.ids() {
            let len = layout.range_of(id).map_or(0, |r| r.len());
            owners.extend(std::iter::repeat(id).take(len));
        }
        for (&id, bound) in bounds {
            bound.validate()?;
            let range = layout.range_of(id).ok_or(OptError::UnknownVariable { id: id.raw() })?;
            per_element[range].iter_mut().for_each(|b| *b = *bound);
        }
        Ok(Self { bounds: per_element, owners })
    }

    /// `true` when every element is unbounded.
    pub fn is_identity(&self) -> bool {
        self.bounds.iter().all(|b| matches!(b, Bound::Unbounded))
    }

    pub fn dim(&self) -> usize {
        self.bounds.len()
    }

    pub fn to_constrained(&self, z: &Theta) -> Theta {
        Theta::from_iter(self.bounds.iter().zip(z.iter()).map(|(b, &zi)| b.to_constrained(zi)))
    }

    /// # Errors
    /// - [`OptError::FlatLengthMismatch`] for a vector of the wrong length.
    /// - [`OptError::StartOutsideBounds`] naming the first offending variable.
    pub fn to_unconstrained(&self, x: &Theta) -> OptResult<Theta> {
        if x.len() != self.bounds.len() {
            return Err(OptError::FlatLengthMismatch { expected: self.bounds.len(), found: x.len() });
        }
        let mut z = Theta::zeros(x.len());
        for (i, (bound, &xi)) in self.bounds.iter().zip(x.iter()).enumerate() {
            z[i] = bound.to_unconstrained(xi).ok_or(OptError::StartOutsideBounds {
                id: self.owners[i].raw(),
                value: xi,
                reason: "Start values must lie strictly inside their bounds.",
            })?;
        }
        Ok(z)
    }

    fn jacobian(&self, z: &Theta) -> Theta {
        Theta::from_iter(self.bounds.iter().zip(z.iter()).map(|(b, &zi)| b.jacobian(zi)))
    }
}

/// Evaluates an inner objective at `x = T(z)` with chain-rule gradients.
#[derive(Debug)]
pub struct ReparameterizedObjective<'a, O: FlatObjective + ?Sized> {
    inner: &'a O,
    reparam: &'a Reparameterization,
}

impl<'a, O: FlatObjective + ?Sized> ReparameterizedObjective<'a, O> {
    pub fn new(inner: &'a O, reparam: &'a Reparameterization) -> Self {
        Self { inner, reparam }
    }
}

impl<'a, O: FlatObjective + ?Sized> FlatObjective for ReparameterizedObjective<'a, O> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn fitness(&self, z: &Theta) -> OptResult<Fitness> {
        self.inner.fitness(&self.reparam.to_constrained(z))
    }

    fn gradient(&self, z: &Theta) -> OptResult<Grad> {
        let g = self.inner.gradient(&self.reparam.to_constrained(z))?;
        Ok(g * self.reparam.jacobian(z))
    }

    fn fitness_and_gradient(&self, z: &Theta) -> OptResult<(Fitness, Grad)> {
        let (f, g) = self.inner.fitness_and_gradient(&self.reparam.to_constrained(z))?;
        Ok((f, g * self.reparam.jacobian(z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::variables::Variable;
    use approx::assert_relative_eq;
    use ndarray::{array, ArrayD, IxDyn};

    #[test]
    // Purpose
    // -------
    // Each bijection round-trips and its Jacobian matches a central
    // difference of `to_constrained`.
    fn bounds_round_trip_and_jacobians_match_finite_differences() {
        let bounds = [
            Bound::Unbounded,
            Bound::Lower(-2.0),
            Bound::Upper(3.0),
            Bound::Interval { lower: -1.0, upper: 4.0 },
        ];
        let h = 1e-6;
        for bound in bounds {
            for &z in &[-3.0, -0.4, 0.0, 1.3, 5.0] {
                let x = bound.to_constrained(z);
                let back = bound.to_unconstrained(x).expect("x should be inside the bound");
                assert_relative_eq!(back, z, epsilon = 1e-8);

                let fd = (bound.to_constrained(z + h) - bound.to_constrained(z - h)) / (2.0 * h);
                assert_relative_eq!(bound.jacobian(z), fd, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn to_unconstrained_rejects_points_on_or_outside_the_bound() {
        let interval = Bound::Interval { lower: 0.0, upper: 1.0 };

        assert_eq!(interval.to_unconstrained(0.0), None);
        assert_eq!(interval.to_unconstrained(1.5), None);
        assert_eq!(Bound::Lower(2.0).to_unconstrained(2.0), None);
        assert_eq!(Bound::Upper(2.0).to_unconstrained(f64::NAN), None);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        assert!(Bound::interval(1.0, 1.0).is_err());
        assert!(Bound::interval(0.0, f64::INFINITY).is_err());
        assert!(Bound::Lower(f64::NAN).validate().is_err());
        assert!(Bound::interval(-1.0, 1.0).is_ok());
    }

    /// f(x) = -(x0 - 0.5)² - (x1 + 1)², bounds applied to x0 only.
    struct Quadratic;

    impl FlatObjective for Quadratic {
        fn dim(&self) -> usize {
            2
        }

        fn fitness(&self, x: &Theta) -> OptResult<Fitness> {
            Ok(-(x[0] - 0.5).powi(2) - (x[1] + 1.0).powi(2))
        }

        fn gradient(&self, x: &Theta) -> OptResult<Grad> {
            Ok(array![-2.0 * (x[0] - 0.5), -2.0 * (x[1] + 1.0)])
        }
    }

    #[test]
    // Purpose
    // -------
    // The reparameterized gradient is the chain rule product, checked
    // against finite differences of the reparameterized fitness.
    //
    // Given
    // -----
    // - A two-variable layout whose first variable lives in (0, 1).
    fn reparameterized_gradient_follows_chain_rule() {
        // Arrange
        let a = VariableId::new(1);
        let b = VariableId::new(2);
        let layout = LatentLayout::new(&[
            Variable::scalar(a, 0.2),
            Variable::new(b, ArrayD::zeros(IxDyn(&[1]))),
        ])
        .expect("layout should be valid");
        let mut bounds = BoundsMap::new();
        bounds.insert(a, Bound::Interval { lower: 0.0, upper: 1.0 });
        let reparam = Reparameterization::new(&layout, &bounds).expect("bounds should be valid");
        let objective = ReparameterizedObjective::new(&Quadratic, &reparam);
        let z = array![0.3, -0.7];
        let h = 1e-6;

        // Act
        let g = objective.gradient(&z).expect("gradient should succeed");

        // Assert
        for i in 0..2 {
            let mut up = z.clone();
            let mut down = z.clone();
            up[i] += h;
            down[i] -= h;
            let fd = (objective.fitness(&up).expect("fitness should succeed")
                - objective.fitness(&down).expect("fitness should succeed"))
                / (2.0 * h);
            assert_relative_eq!(g[i], fd, epsilon = 1e-7);
        }
        assert!(!reparam.is_identity());
    }

    #[test]
    fn reparameterization_reports_unknown_variables_and_bad_starts() {
        let a = VariableId::new(1);
        let layout = LatentLayout::new(&[Variable::scalar(a, 0.2)]).expect("layout should be valid");

        let mut unknown = BoundsMap::new();
        unknown.insert(VariableId::new(9), Bound::Lower(0.0));
        assert_eq!(
            Reparameterization::new(&layout, &unknown),
            Err(OptError::UnknownVariable { id: 9 })
        );

        let mut bounds = BoundsMap::new();
        bounds.insert(a, Bound::Lower(1.0));
        let reparam = Reparameterization::new(&layout, &bounds).expect("bounds should be valid");
        match reparam.to_unconstrained(&array![0.2]) {
            Err(OptError::StartOutsideBounds { id, .. }) => assert_eq!(id, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
