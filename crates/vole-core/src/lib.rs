//! # vole-core
//!
//! Tensor primitives and the shared error type for Vole.
//!
//! This crate provides:
//! - [`Tensor`] — immutable host-resident n-dimensional array
//! - [`TensorList`] — ordered tensor collection used by records and batches
//! - [`Shape`] — dimension sizes and row-major strides
//! - [`DType`] — element types (F32, F64, U8, I64)
//! - [`Error`] / [`Result`] — one error type for the whole workspace
// The tensor here is the narrow runtime surface the data pipeline consumes:
// allocation, slicing, stacking, reshaping and shape introspection.

pub mod dtype;
pub mod error;
pub mod list;
pub mod shape;
pub mod tensor;

pub use dtype::DType;
pub use error::{Error, Result};
pub use list::TensorList;
pub use shape::Shape;
pub use tensor::Tensor;
