use crate::shape::Shape;

/// All errors that can occur when addressing or building tensors.
///
/// Decoding failures live in `idxflow-data`; this enum only covers the
/// in-memory store: shape/element-count invariants and multi-index lookups.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A multi-index had the wrong number of coordinates.
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// One coordinate of a multi-index was past the end of its axis.
    #[error("index out of bounds: axis {axis} has extent {extent}, got index {index}")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        extent: usize,
    },

    /// Element count mismatch when creating a tensor from a buffer.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// The product of the dimensions does not fit in `usize`.
    #[error("shape {shape} has too many elements to address")]
    ElementCountOverflow { shape: Shape },

    /// IDX tensors have between 1 and 255 dimensions.
    #[error("tensor rank must be in 1..=255, got {rank}")]
    InvalidRank { rank: usize },
}

/// Convenience Result type used throughout idxflow.
pub type Result<T> = std::result::Result<T, Error>;

