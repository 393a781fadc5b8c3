//! variables::layout — canonical flat ordering of the latent variables.
//!
//! Purpose
//! -------
//! Capture, once per optimization run, the ordered list of latent variables
//! with their shapes, and convert between the model's `VariableId → Tensor`
//! view and the flat `Theta` vector the algorithms work on.
//!
//! Key behaviors
//! -------------
//! - [`LatentLayout::flatten`] concatenates each tensor's row-major elements
//!   in layout order into one freshly allocated buffer.
//! - [`LatentLayout::unflatten`] is its exact inverse.
//! - [`LatentLayout::align_gradient`] flattens a gradient map the same way,
//!   zero-filling variables the model reported no gradient for.
//!
//! Invariants & assumptions
//! ------------------------
//! - The layout is immutable; ids are unique and the variable list is
//!   non-empty.
//! - `flatten(unflatten(v)) == v` and `unflatten(flatten(m)) == m`
//!   bit-for-bit, since values are only copied.
//! - Entries in value or gradient maps whose ids are not part of the layout
//!   (e.g., observed variables) are ignored.
//!
//! Testing notes
//! -------------
//! - Unit tests cover ordering, zero-fill, shape and length errors, and a
//!   proptest round trip over random mixed-rank layouts.
use std::collections::HashMap;
use std::ops::Range;

use ndarray::{s, Array1, ArrayD, IxDyn};

use crate::optimization::{
    errors::{OptError, OptResult},
    types::{Grad, Theta},
    variables::types::{GradientMap, Tensor, Variable, VariableId, VariableValues},
};

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    id: VariableId,
    shape: Vec<usize>,
    offset: usize,
    len: usize,
}

impl Slot {
    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    fn check_shape(&self, tensor: &Tensor) -> OptResult<()> {
        if tensor.shape() != self.shape.as_slice() {
            return Err(OptError::ShapeMismatch {
                id: self.id.raw(),
                expected: self.shape.clone(),
                found: tensor.shape().to_vec(),
            });
        }
        Ok(())
    }
}

/// Ordered ids, shapes and flat offsets of a model's latent variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentLayout {
    slots: Vec<Slot>,
    index: HashMap<VariableId, usize>,
    dim: usize,
}

impl LatentLayout {
    /// Capture the layout of `variables` in the given order.
    ///
    /// # Errors
    /// - [`OptError::NoLatentVariables`] for an empty list.
    /// - [`OptError::DuplicateVariable`] if an id appears twice.
    pub fn new(variables: &[Variable]) -> OptResult<Self> {
        if variables.is_empty() {
            return Err(OptError::NoLatentVariables);
        }
        let mut slots = Vec::with_capacity(variables.len());
        let mut index = HashMap::with_capacity(variables.len());
        let mut offset = 0;
        for variable in variables {
            if index.insert(variable.id, slots.len()).is_some() {
                return Err(OptError::DuplicateVariable { id: variable.id.raw() });
            }
            let len = variable.len();
            slots.push(Slot { id: variable.id, shape: variable.shape().to_vec(), offset, len });
            offset += len;
        }
        Ok(Self { slots, index, dim: offset })
    }

    /// Total number of scalar elements (length of `Theta`).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of latent variables.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Variable ids in flat order.
    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn shape_of(&self, id: VariableId) -> Option<&[usize]> {
        self.slot(id).map(|slot| slot.shape.as_slice())
    }

    /// Index range of `id`'s elements inside `Theta`.
    pub fn range_of(&self, id: VariableId) -> Option<Range<usize>> {
        self.slot(id).map(Slot::range)
    }

    /// Concatenate the latent values into one flat vector.
    ///
    /// Parameters
    /// ----------
    /// - `values`: `&VariableValues`
    ///   One tensor per latent id. Entries for ids outside the layout are
    ///   ignored.
    ///
    /// Returns
    /// -------
    /// `OptResult<Theta>`
    ///   Elements of each tensor in row-major order, variables in layout
    ///   order; length [`Self::dim`].
    ///
    /// Errors
    /// ------
    /// - [`OptError::MissingVariableValue`] if a latent id has no value.
    /// - [`OptError::ShapeMismatch`] if a value's shape differs from the layout.
    pub fn flatten(&self, values: &VariableValues) -> OptResult<Theta> {
        let mut flat = Array1::zeros(self.dim);
        for slot in &self.slots {
            let tensor = values
                .get(&slot.id)
                .ok_or(OptError::MissingVariableValue { id: slot.id.raw() })?;
            slot.check_shape(tensor)?;
            flat.slice_mut(s![slot.range()]).iter_mut().zip(tensor.iter()).for_each(|(dst, &src)| {
                *dst = src;
            });
        }
        Ok(flat)
    }

    /// Split a flat vector back into per-variable tensors.
    ///
    /// # Errors
    /// Returns [`OptError::FlatLengthMismatch`] if `flat.len() != self.dim()`.
    pub fn unflatten(&self, flat: &Theta) -> OptResult<VariableValues> {
        self.check_len(flat.len())?;
        let mut values = HashMap::with_capacity(self.slots.len());
        for slot in &self.slots {
            let elements = flat.slice(s![slot.range()]).to_vec();
            let tensor = ArrayD::from_shape_vec(IxDyn(&slot.shape), elements).map_err(|_| {
                OptError::FlatLengthMismatch { expected: slot.len, found: flat.len() }
            })?;
            values.insert(slot.id, tensor);
        }
        Ok(values)
    }

    /// Flatten a gradient map in layout order, zero-filling absent variables.
    ///
    /// # Errors
    /// Returns [`OptError::ShapeMismatch`] if a present gradient has the wrong
    /// shape.
    pub fn align_gradient(&self, gradient: &GradientMap) -> OptResult<Grad> {
        let mut flat = Array1::zeros(self.dim);
        for slot in &self.slots {
            if let Some(partial) = gradient.get(&slot.id) {
                slot.check_shape(partial)?;
                flat.slice_mut(s![slot.range()])
                    .iter_mut()
                    .zip(partial.iter())
                    .for_each(|(dst, &src)| *dst = src);
            }
        }
        Ok(flat)
    }

    pub(crate) fn check_len(&self, found: usize) -> OptResult<()> {
        if found != self.dim {
            return Err(OptError::FlatLengthMismatch { expected: self.dim, found });
        }
        Ok(())
    }

    fn slot(&self, id: VariableId) -> Option<&Slot> {
        self.index.get(&id).map(|&i| &self.slots[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD, IxDyn};
    use proptest::prelude::*;

    fn id(raw: u64) -> VariableId {
        VariableId::new(raw)
    }

    fn tensor(shape: &[usize], values: Vec<f64>) -> Tensor {
        ArrayD::from_shape_vec(IxDyn(shape), values).expect("shape should match values")
    }

    fn sample_variables() -> Vec<Variable> {
        vec![
            Variable::scalar(id(7), 1.5),
            Variable::new(id(2), tensor(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])),
            Variable::new(id(9), tensor(&[3], vec![-1.0, -2.0, -3.0])),
        ]
    }

    fn values_of(variables: &[Variable]) -> VariableValues {
        variables.iter().map(|v| (v.id, v.value.clone())).collect()
    }

    #[test]
    // Purpose
    // -------
    // Flattening follows list order, then row-major order within a tensor.
    //
    // Given
    // -----
    // - A scalar, a 2×2 matrix and a length-3 vector, listed in that order.
    //
    // Expect
    // ------
    // - `dim == 8` and the flat vector is [s, m00, m01, m10, m11, v0, v1, v2].
    fn flatten_concatenates_in_list_then_row_major_order() {
        // Arrange
        let variables = sample_variables();
        let layout = LatentLayout::new(&variables).expect("layout should be valid");

        // Act
        let flat = layout.flatten(&values_of(&variables)).expect("flatten should succeed");

        // Assert
        assert_eq!(layout.dim(), 8);
        assert_eq!(flat, array![1.5, 1.0, 2.0, 3.0, 4.0, -1.0, -2.0, -3.0]);
        assert_eq!(layout.range_of(id(2)), Some(1..5));
        assert_eq!(layout.ids().collect::<Vec<_>>(), vec![id(7), id(2), id(9)]);
    }

    #[test]
    // Purpose
    // -------
    // A transposed (non-standard memory order) view still flattens in
    // logical row-major order.
    fn flatten_uses_logical_order_for_transposed_tensors() {
        let base = tensor(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        let transposed = base.t().to_owned();
        let variables = vec![Variable::new(id(1), transposed)];
        let layout = LatentLayout::new(&variables).expect("layout should be valid");

        let flat = layout.flatten(&values_of(&variables)).expect("flatten should succeed");

        assert_eq!(flat, array![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn new_rejects_empty_and_duplicate_lists() {
        assert_eq!(LatentLayout::new(&[]), Err(OptError::NoLatentVariables));

        let dup = vec![Variable::scalar(id(1), 0.0), Variable::scalar(id(1), 1.0)];
        assert_eq!(LatentLayout::new(&dup), Err(OptError::DuplicateVariable { id: 1 }));
    }

    #[test]
    // Purpose
    // -------
    // Variables the model reports no gradient for contribute zeros, and
    // gradients of non-latent ids are ignored.
    fn align_gradient_zero_fills_missing_variables() {
        // Arrange
        let layout = LatentLayout::new(&sample_variables()).expect("layout should be valid");
        let mut gradient = GradientMap::new();
        gradient.insert(id(9), tensor(&[3], vec![0.5, 0.25, 0.125]));
        gradient.insert(id(100), tensor(&[1], vec![42.0]));

        // Act
        let flat = layout.align_gradient(&gradient).expect("alignment should succeed");

        // Assert
        assert_eq!(flat, array![0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn align_gradient_rejects_wrong_shape() {
        let layout = LatentLayout::new(&sample_variables()).expect("layout should be valid");
        let mut gradient = GradientMap::new();
        gradient.insert(id(2), tensor(&[4], vec![0.0; 4]));

        let err = layout.align_gradient(&gradient).expect_err("shape should be rejected");

        assert_eq!(err, OptError::ShapeMismatch { id: 2, expected: vec![2, 2], found: vec![4] });
    }

    #[test]
    fn flatten_reports_missing_values_and_unflatten_reports_bad_length() {
        let layout = LatentLayout::new(&sample_variables()).expect("layout should be valid");
        let mut values = values_of(&sample_variables());
        values.remove(&id(9));

        assert_eq!(layout.flatten(&values), Err(OptError::MissingVariableValue { id: 9 }));
        assert_eq!(
            layout.unflatten(&Array1::zeros(7)),
            Err(OptError::FlatLengthMismatch { expected: 8, found: 7 })
        );
    }

    fn shapes_and_flat() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<f64>)> {
        prop::collection::vec(prop::collection::vec(1usize..4, 0..3), 1..5).prop_flat_map(
            |shapes| {
                let total: usize = shapes.iter().map(|s| s.iter().product::<usize>()).sum();
                (Just(shapes), prop::collection::vec(-1e6f64..1e6, total))
            },
        )
    }

    proptest! {
        #[test]
        fn unflatten_then_flatten_is_identity((shapes, values) in shapes_and_flat()) {
            let variables: Vec<Variable> = shapes
                .iter()
                .enumerate()
                .map(|(i, shape)| Variable::new(id(i as u64), ArrayD::zeros(IxDyn(shape))))
                .collect();
            let layout = LatentLayout::new(&variables).expect("layout should be valid");
            let flat = Array1::from(values);

            let point = layout.unflatten(&flat).expect("unflatten should succeed");
            let back = layout.flatten(&point).expect("flatten should succeed");

            prop_assert_eq!(&back, &flat);
            for (i, shape) in shapes.iter().enumerate() {
                prop_assert_eq!(point[&id(i as u64)].shape(), shape.as_slice());
            }
            prop_assert_eq!(layout.unflatten(&back).expect("unflatten should succeed"), point);
        }
    }
}
