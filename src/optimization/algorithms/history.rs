//! Flat ring buffer of L-BFGS `(s, y, ρ)` pairs.
//!
//! Stores `m` pairs of n-dimensional vectors as rows of two `m × n`
//! matrices plus the scalars `ρ = 1 / sᵀy`. Pushing past capacity
//! overwrites the oldest pair in O(n) without shifting.
use ndarray::{Array1, Array2, ArrayView1};

#[derive(Debug, Clone, PartialEq)]
pub struct RingHistory {
    s: Array2<f64>,
    y: Array2<f64>,
    rho: Array1<f64>,
    head: usize,
    len: usize,
}

impl RingHistory {
    /// Empty history of capacity `m` for vectors of length `n`.
    pub fn new(m: usize, n: usize) -> Self {
        debug_assert!(m > 0, "L-BFGS history depth m must be > 0");
        Self {
            s: Array2::zeros((m, n)),
            y: Array2::zeros((m, n)),
            rho: Array1::zeros(m),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rho.len()
    }

    /// Push a new `(s, y, ρ)` entry, overwriting the oldest when full.
    pub fn push(&mut self, s: &Array1<f64>, y: &Array1<f64>, rho: f64) {
        let m = self.capacity();
        let slot = if self.len < m {
            let slot = (self.head + self.len) % m;
            self.len += 1;
            slot
        } else {
            let slot = self.head;
            self.head = (self.head + 1) % m;
            slot
        };
        self.s.row_mut(slot).assign(s);
        self.y.row_mut(slot).assign(y);
        self.rho[slot] = rho;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `s` at logical index `i` (0 = oldest, len-1 = newest).
    #[inline]
    pub fn s(&self, i: usize) -> ArrayView1<'_, f64> {
        self.s.row(self.slot(i))
    }

    #[inline]
    pub fn y(&self, i: usize) -> ArrayView1<'_, f64> {
        self.y.row(self.slot(i))
    }

    #[inline]
    pub fn rho(&self, i: usize) -> f64 {
        self.rho[self.slot(i)]
    }

    #[inline]
    fn slot(&self, i: usize) -> usize {
        (self.head + i) % self.capacity()
    }
}
