// IdxTensor — the decoded tensor store
//
// An IdxTensor is what a successful decode produces: a shape plus a flat
// buffer of unsigned bytes in row-major order. It is write-once. The
// decoder hands over ownership when the last payload byte arrives and
// nothing can mutate the bytes afterwards.
//
// Every accessor goes through `Layout`, so the stride arithmetic lives in
// exactly one place.

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;

/// The rank is stored in a single header byte.
pub const MAX_RANK: usize = 255;

/// A complete, immutable N-dimensional tensor of `u8` elements.
///
/// Invariant: `data.len() == shape.elem_count()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxTensor {
    layout: Layout,
    data: Vec<u8>,
}

impl IdxTensor {
    /// Create a tensor from a shape and a row-major byte buffer.
    ///
    /// Fails if the rank is outside `1..=255` or the buffer length does not
    /// match the shape's element count.
    pub fn new(shape: impl Into<Shape>, data: Vec<u8>) -> Result<Self> {
        let shape = shape.into();
        if !(1..=MAX_RANK).contains(&shape.rank()) {
            return Err(Error::InvalidRank { rank: shape.rank() });
        }
        let expected = shape
            .checked_elem_count()
            .ok_or_else(|| Error::ElementCountOverflow {
                shape: shape.clone(),
            })?;
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(IdxTensor {
            layout: Layout::contiguous(shape),
            data,
        })
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Total number of elements (equal to the number of payload bytes).
    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    /// Extent of the outermost dimension (the sample count for IDX files).
    pub fn outer_dim(&self) -> usize {
        self.dims().first().copied().unwrap_or(0)
    }

    /// The raw payload in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the tensor and return its payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Flat byte offset of a multi-index. Debug builds assert the index is
    /// in range.
    pub fn offset_of(&self, index: &[usize]) -> usize {
        self.layout.flat_index(index)
    }

    /// Flat byte offset of a multi-index, validated against the shape.
    pub fn checked_offset(&self, index: &[usize]) -> Result<usize> {
        self.layout.checked_flat_index(index)
    }

    /// Element at a multi-index.
    pub fn get(&self, index: &[usize]) -> Result<u8> {
        let offset = self.checked_offset(index)?;
        Ok(self.data[offset])
    }

    /// The contiguous sub-tensor at position `i` of the outermost axis,
    /// e.g. one `height × width` image of an image stack.
    pub fn outer_slice(&self, i: usize) -> Result<&[u8]> {
        let extent = self.outer_dim();
        if i >= extent {
            return Err(Error::IndexOutOfBounds {
                axis: 0,
                index: i,
                extent,
            });
        }
        let stride = self.layout.outer_stride();
        let start = i * stride;
        Ok(&self.data[start..start + stride])
    }
}
