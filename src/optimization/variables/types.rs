//! variables::types — identities and tensor values of latent variables.
//!
//! A latent variable is an opaque [`VariableId`] plus a tensor value of
//! fixed shape. Scalars are rank-0 tensors holding a single element. The
//! optimizer only reads these values; the model owns them.
use ndarray::{ArrayD, IxDyn};
use std::collections::HashMap;
use std::fmt;

/// Dense, row-major `f64` tensor of arbitrary rank.
pub type Tensor = ArrayD<f64>;

/// Map from variable identity to a tensor value (a point in model space).
pub type VariableValues = HashMap<VariableId, Tensor>;

/// Map from variable identity to `∂fitness/∂variable`.
///
/// Absent entries are treated as zero tensors of the variable's shape.
pub type GradientMap = HashMap<VariableId, Tensor>;

/// Opaque, hashable identity of a latent variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u64);

impl VariableId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A latent variable as exposed by a model: identity plus current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: VariableId,
    pub value: Tensor,
}

impl Variable {
    pub fn new(id: VariableId, value: Tensor) -> Self {
        Self { id, value }
    }

    /// Rank-0 variable holding a single value.
    pub fn scalar(id: VariableId, value: f64) -> Self {
        Self { id, value: ArrayD::from_elem(IxDyn(&[]), value) }
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Number of scalar elements (`1` for a rank-0 tensor).
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
