// Error types for decoding IDX streams and loading sample datasets.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::observer::TensorRole;

/// Why a single tensor failed to decode.
///
/// Every variant is terminal for the tensor being decoded: the decoder never
/// retries and never hands out the partial payload.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// The magic word did not match `0x000008RR`, or declared rank 0.
    #[error("invalid IDX header: magic word {magic:#010x}")]
    InvalidHeader { magic: u32 },

    /// The stream ended before the header and payload were complete.
    #[error(
        "IDX stream incomplete: read {header_values_read}/{expected_header_values} header words \
         and {values_read}/{expected_values} payload bytes"
    )]
    Incomplete {
        header_values_read: usize,
        expected_header_values: usize,
        values_read: usize,
        expected_values: usize,
    },

    /// The declared dimensions multiply past `usize::MAX`.
    #[error("IDX dimensions {dims:?} overflow the addressable element count")]
    ShapeOverflow { dims: Vec<u32> },

    /// The payload buffer could not be allocated, or exceeds the configured
    /// limit.
    #[error("cannot allocate {requested} payload bytes")]
    OutOfMemory { requested: usize },

    /// The input file could not be opened; nothing was decoded.
    #[error("cannot open IDX file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The underlying chunk source failed mid-stream.
    #[error("I/O error while reading IDX stream: {0}")]
    Io(#[source] Arc<io::Error>),

    /// The decoded buffer was rejected by the tensor store.
    #[error(transparent)]
    Store(#[from] idxflow_core::Error),
}

impl DecodeError {
    /// True for a header whose magic masks correctly but declares rank 0.
    pub fn is_zero_rank(&self) -> bool {
        matches!(self, DecodeError::InvalidHeader { magic } if *magic & 0xFFFF_FF00 == 0x800)
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Io(Arc::new(e))
    }
}

/// Why a dataset load call failed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("cannot open {role} file {}: {source}", path.display())]
    SourceOpen {
        role: TensorRole,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither the plain nor the `.gz` variant of a file exists.
    #[error("IDX file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// One of the two tensors failed to decode.
    #[error("failed to decode {role} tensor: {source}")]
    Decode {
        role: TensorRole,
        #[source]
        source: DecodeError,
    },

    /// The label tensor is not rank 1.
    #[error("label tensor must have 1 dimension, got {rank}")]
    InvalidLabelShape { rank: usize },

    /// The image tensor is not rank 3 (`[count, height, width]`).
    #[error("image tensor must have 3 dimensions (count, rows, columns), got {rank}")]
    InvalidImageShape { rank: usize },

    /// A buffer built in memory did not match its shape.
    #[error(transparent)]
    Store(#[from] idxflow_core::Error),
}
