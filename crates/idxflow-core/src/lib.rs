//! # idxflow-core
//!
//! In-memory types shared by the idxflow crates.
//!
//! This crate provides:
//! - [`Shape`] / [`Layout`] — extents and row-major strides
//! - [`IdxTensor`] — the write-once byte tensor produced by decoding
//! - [`Matrix`] — the owned `f32` buffer samples are delivered in
// - Error: one error enum for shape and indexing failures

pub mod error;
pub mod layout;
pub mod matrix;
pub mod shape;
pub mod tensor;

pub use error::{Error, Result};
pub use layout::Layout;
pub use matrix::Matrix;
pub use shape::Shape;
pub use tensor::{IdxTensor, MAX_RANK};
