use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — shape + row-major strides
//
// IDX payloads are always stored contiguously, outermost dimension first, so
// a layout here never carries an offset or permuted strides. What it does
// own is the one formula every lookup goes through:
//
//   offset = Σ_i index[i] * Π_{j>i} dims[j]
//
// Keeping it here, away from the decoder, lets it be tested on its own and
// gives the tensor store a single place to bounds-check multi-indices.

/// Layout describes how a tensor's logical shape maps to flat storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
}

impl Layout {
    /// Create a new contiguous layout for the given shape.
    pub fn contiguous(shape: Shape) -> Self {
        let strides = shape.stride_contiguous();
        Layout { shape, strides }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Compute the flat index into storage for a given multi-dimensional index.
    ///
    /// Out-of-range coordinates are the caller's responsibility; debug builds
    /// assert on them, release builds compute whatever the formula yields.
    pub fn flat_index(&self, index: &[usize]) -> usize {
        debug_assert_eq!(
            index.len(),
            self.rank(),
            "multi-index {index:?} does not match rank of shape {}",
            self.shape
        );
        let mut flat = 0;
        for (axis, (&idx, &stride)) in index.iter().zip(&self.strides).enumerate() {
            debug_assert!(
                idx < self.dims()[axis],
                "index {idx} out of bounds for axis {axis} of shape {}",
                self.shape
            );
            flat += idx * stride;
        }
        flat
    }

    /// Like [`Layout::flat_index`] but validates rank and every coordinate.
    pub fn checked_flat_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() {
            return Err(Error::RankMismatch {
                expected: self.rank(),
                got: index.len(),
            });
        }
        for (axis, (&idx, &extent)) in index.iter().zip(self.dims()).enumerate() {
            if idx >= extent {
                return Err(Error::IndexOutOfBounds {
                    axis,
                    index: idx,
                    extent,
                });
            }
        }
        Ok(self.flat_index(index))
    }

    /// Number of elements in one step along the outermost axis, i.e. the
    /// size of a single sub-tensor such as one image in an image stack.
    pub fn outer_stride(&self) -> usize {
        self.strides.first().copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        assert_eq!(layout.strides(), &[3, 1]);
        assert_eq!(layout.outer_stride(), 3);
    }

    #[test]
    fn test_flat_index() {
        let layout = Layout::contiguous(Shape::from((2, 3, 4)));
        // Element at [1, 2, 3]: 1*12 + 2*4 + 3*1 = 23
        assert_eq!(layout.flat_index(&[1, 2, 3]), 23);
        assert_eq!(layout.flat_index(&[0, 0, 0]), 0);
    }

    #[test]
    fn test_flat_index_visits_every_offset_once() {
        let layout = Layout::contiguous(Shape::from((3, 2, 5)));
        let mut seen = Vec::new();
        for i in 0..3 {
            for j in 0..2 {
                for k in 0..5 {
                    seen.push(layout.flat_index(&[i, j, k]));
                }
            }
        }
        let expected: Vec<usize> = (0..30).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_checked_flat_index_rejects_bad_rank() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let err = layout.checked_flat_index(&[1]).unwrap_err();
        assert!(matches!(err, Error::RankMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_checked_flat_index_rejects_out_of_bounds() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let err = layout.checked_flat_index(&[1, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfBounds {
                axis: 1,
                index: 3,
                extent: 3
            }
        ));
        assert_eq!(layout.checked_flat_index(&[1, 2]).unwrap(), 5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of bounds")]
    fn test_flat_index_asserts_in_debug() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        layout.flat_index(&[2, 0]);
    }
}
