//! Small closed-form objectives shared by the algorithm unit tests.
use std::cell::Cell;

use ndarray::{array, Array2};

use crate::optimization::{
    errors::OptResult,
    oracle::FlatObjective,
    types::{Fitness, Grad, Theta},
};

/// `f(x) = -(x - center)²` in one dimension.
pub(crate) struct Parabola {
    pub center: f64,
}

impl FlatObjective for Parabola {
    fn dim(&self) -> usize {
        1
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        let d = theta[0] - self.center;
        Ok(-d * d)
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        Ok(array![-2.0 * (theta[0] - self.center)])
    }
}

/// `f(x) = -½ (x - c)ᵀ A (x - c)` with `A` symmetric positive definite.
///
/// An optional barrier makes every point with `x[0] < barrier` impossible.
pub(crate) struct Quadratic {
    a: Array2<f64>,
    c: Theta,
    barrier: Option<f64>,
}

impl Quadratic {
    /// `A = [[2, 0.5], [0.5, 4]]`, `c = (1, -0.5)`.
    pub fn two_dim() -> Self {
        Self { a: array![[2.0, 0.5], [0.5, 4.0]], c: array![1.0, -0.5], barrier: None }
    }

    /// `A = [[4, 1, 0], [1, 3, 0.5], [0, 0.5, 2]]`, `c = (1, -2, 3)`.
    pub fn three_dim() -> Self {
        Self {
            a: array![[4.0, 1.0, 0.0], [1.0, 3.0, 0.5], [0.0, 0.5, 2.0]],
            c: array![1.0, -2.0, 3.0],
            barrier: None,
        }
    }

    pub fn with_barrier_at(mut self, barrier: f64) -> Self {
        self.barrier = Some(barrier);
        self
    }

    fn impossible(&self, theta: &Theta) -> bool {
        self.barrier.is_some_and(|b| theta[0] < b)
    }
}

impl FlatObjective for Quadratic {
    fn dim(&self) -> usize {
        self.c.len()
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        if self.impossible(theta) {
            return Ok(f64::NEG_INFINITY);
        }
        let d = theta - &self.c;
        Ok(-0.5 * d.dot(&self.a.dot(&d)))
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        let d = theta - &self.c;
        Ok(-self.a.dot(&d))
    }
}

/// `f(x) = -(x - 2)⁴ - (x - 2)²` in one dimension.
pub(crate) struct Quartic;

impl FlatObjective for Quartic {
    fn dim(&self) -> usize {
        1
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        let d = theta[0] - 2.0;
        Ok(-d.powi(4) - d * d)
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        let d = theta[0] - 2.0;
        Ok(array![-4.0 * d.powi(3) - 2.0 * d])
    }
}

/// `f(x) = -(x - 2)²` for `x < 3`, impossible (`-∞`, NaN gradient) beyond.
pub(crate) struct Barrier;

impl FlatObjective for Barrier {
    fn dim(&self) -> usize {
        1
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        let x = theta[0];
        if x < 3.0 {
            Ok(-(x - 2.0) * (x - 2.0))
        } else {
            Ok(f64::NEG_INFINITY)
        }
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        let x = theta[0];
        if x < 3.0 {
            Ok(array![-2.0 * (x - 2.0)])
        } else {
            Ok(array![f64::NAN])
        }
    }
}

/// Wraps an objective and counts oracle calls. A combined call counts as
/// one fitness and one gradient evaluation.
pub(crate) struct Counting<O> {
    inner: O,
    fitnesses: Cell<usize>,
    gradients: Cell<usize>,
}

impl<O> Counting<O> {
    pub fn new(inner: O) -> Self {
        Self { inner, fitnesses: Cell::new(0), gradients: Cell::new(0) }
    }

    pub fn fitnesses(&self) -> usize {
        self.fitnesses.get()
    }

    pub fn gradients(&self) -> usize {
        self.gradients.get()
    }
}

impl<O: FlatObjective> FlatObjective for Counting<O> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn fitness(&self, theta: &Theta) -> OptResult<Fitness> {
        self.fitnesses.set(self.fitnesses.get() + 1);
        self.inner.fitness(theta)
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        self.gradients.set(self.gradients.get() + 1);
        self.inner.gradient(theta)
    }

    fn fitness_and_gradient(&self, theta: &Theta) -> OptResult<(Fitness, Grad)> {
        self.fitnesses.set(self.fitnesses.get() + 1);
        self.gradients.set(self.gradients.get() + 1);
        self.inner.fitness_and_gradient(theta)
    }
}
