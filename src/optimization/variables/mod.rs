//! variables — latent variable identities, tensor values and flat layout.
//!
//! Purpose
//! -------
//! Bridge the model's named, tensor-shaped latent variables and the flat
//! `Theta` vectors the algorithms operate on.
//!
//! Key behaviors
//! -------------
//! - [`types`]: `VariableId`, `Variable`, `Tensor` and the value/gradient
//!   map aliases.
//! - [`layout`]: `LatentLayout`, captured once per run, providing
//!   `flatten`, `unflatten` and `align_gradient`.
//!
//! Conventions
//! -----------
//! - Flat order is list order of the latent variables, row-major within each
//!   tensor.
//! - A missing gradient entry means a zero gradient, never an error.
pub mod layout;
pub mod types;

pub use self::layout::LatentLayout;
pub use self::types::{GradientMap, Tensor, Variable, VariableId, VariableValues};
