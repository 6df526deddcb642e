//! # idxflow
//!
//! Stream IDX tensor files (the MNIST container format) into normalized,
//! labeled samples.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idxflow::prelude::*;
//!
//! let ds = SampleDataset::load(
//!     "data/train-labels-idx1-ubyte.gz",
//!     "data/train-images-idx3-ubyte.gz",
//! )?;
//! let sample = ds.get_sample(0);
//! if let (Some(image), Some(label)) = (&sample.image, sample.label) {
//!     println!("label {label}\n{}", image.to_ansi_grayscale());
//! }
//! # Ok::<(), idxflow::LoadError>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `idxflow-core` | Shape, Layout, IdxTensor store, Matrix, Error |
//! | `idxflow-data` | Streaming decoder, gzip chunk reader, encoder, SampleDataset, MNIST |

/// Re-export core types.
pub use idxflow_core::{Error, IdxTensor, Layout, Matrix, Result, Shape, MAX_RANK};

/// Re-export decoding and dataset types.
pub use idxflow_data::{
    decode_bytes, decode_file, decode_source, encode_tensor, write_tensor, write_tensor_file,
    ChunkSource, Dataset, DecodeError, DecodeState, DecoderConfig, Event, GzChunkReader,
    IdxDecoder, LoadConfig, LoadError, NullObserver, Observer, Sample, SampleDataset, SampleFlags,
    TensorRole, TracingObserver, IDX_MAGIC,
};

/// MNIST file layout and the synthetic generator.
pub mod mnist {
    pub use idxflow_data::mnist::*;
}

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::mnist::MnistSplit;
    pub use crate::{
        Dataset, DecoderConfig, IdxDecoder, IdxTensor, LoadConfig, Matrix, Observer, Sample,
        SampleDataset, SampleFlags, Shape,
    };
}
