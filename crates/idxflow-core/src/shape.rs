use std::fmt;

// Shape — extents of an IDX tensor
//
// IDX files declare between 1 and 255 dimensions, each a big-endian u32,
// outermost first:
//   - labels: Shape([60000])
//   - images: Shape([60000, 28, 28])
//
// The shape determines:
//   1. How many payload bytes follow the header (product of all dims)
//   2. The row-major strides used to address a single element
//
// Unlike a general-purpose tensor library, a rank-0 shape holds no elements:
// the file format has no scalar encoding, so there is nothing to address.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// Build a shape from the u32 extents stored in an IDX header.
    pub fn from_u32_dims(dims: &[u32]) -> Self {
        Shape(dims.iter().map(|&d| d as usize).collect())
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions, 0 for rank 0).
    ///
    /// # Panics
    /// Panics on overflow; use [`Shape::checked_elem_count`] for untrusted
    /// extents.
    pub fn elem_count(&self) -> usize {
        match self.checked_elem_count() {
            Some(n) => n,
            None => panic!("element count of shape {self} overflows usize"),
        }
    }

    /// Total number of elements, or `None` if the product overflows `usize`.
    pub fn checked_elem_count(&self) -> Option<usize> {
        if self.0.is_empty() {
            return Some(0);
        }
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Compute the contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1]:
    ///   - Moving 1 step in dim 0 jumps 12 elements (3*4)
    ///   - Moving 1 step in dim 1 jumps 4 elements
    ///   - Moving 1 step in dim 2 jumps 1 element
    ///
    /// Saturates instead of overflowing, which only matters for shapes with
    /// a zero extent and therefore no addressable elements.
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.rank()];
        if self.rank() > 0 {
            strides[self.rank() - 1] = 1;
            for i in (0..self.rank() - 1).rev() {
                strides[i] = strides[i + 1].saturating_mul(self.0[i + 1]);
            }
        }
        strides
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_zero_has_no_elements() {
        let s = Shape::new(vec![]);
        assert_eq!(s.rank(), 0);
        assert_eq!(s.elem_count(), 0);
        assert!(s.stride_contiguous().is_empty());
    }

    #[test]
    fn test_vector_shape() {
        let s = Shape::from(5);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.elem_count(), 5);
        assert_eq!(s.stride_contiguous(), vec![1]);
    }

    #[test]
    fn test_image_stack_strides() {
        let s = Shape::from((10, 28, 28));
        assert_eq!(s.stride_contiguous(), vec![784, 28, 1]);
        assert_eq!(s.elem_count(), 7840);
    }

    #[test]
    fn test_zero_extent() {
        let s = Shape::from((0, 28, 28));
        assert_eq!(s.elem_count(), 0);
        assert_eq!(s.stride_contiguous(), vec![784, 28, 1]);
    }

    #[test]
    fn test_checked_elem_count_overflow() {
        let s = Shape::new(vec![usize::MAX, 2]);
        assert_eq!(s.checked_elem_count(), None);
    }

    #[test]
    fn test_from_u32_dims() {
        let s = Shape::from_u32_dims(&[60000, 28, 28]);
        assert_eq!(s.dims(), &[60000, 28, 28]);
    }

    #[test]
    fn test_display() {
        let s = Shape::from((3, 4));
        assert_eq!(format!("{}", s), "[3, 4]");
    }
}
