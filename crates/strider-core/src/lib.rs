//! # strider-core
//!
//! A minimal n-dimensional array engine.
//!
//! This crate provides:
//! - [`DType`] — the three element types (F32, F64, I32) and their conversions
//! - [`Shape`] / [`Layout`] — shape, row-major strides, and view offsets
//! - [`Storage`] — reference-counted element buffers shared by tensors and views
//! - [`Tensor`] — creation, copy, reshape, slicing, element access
//! - Broadcasting elementwise arithmetic ([`BinaryOp`])
//! - Reductions (`sum`, `mean`) and naive linear algebra (`dot`, `matmul`)
//!
//! Everything is single-threaded: tensors are neither `Send` nor `Sync`.

pub mod broadcast;
pub mod dtype;
pub mod error;
pub mod layout;
mod linalg;
mod reduce;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use broadcast::BinaryOp;
pub use dtype::{DType, WithDType};
pub use error::{Error, ErrorKind, Result};
pub use layout::Layout;
pub use shape::Shape;
pub use storage::{live_buffers, Storage};
pub use tensor::{Role, Tensor};
