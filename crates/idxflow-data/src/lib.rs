//! # idxflow-data
//!
//! Streaming IDX decoding and labeled sample datasets.
//!
//! This crate provides:
//! - [`IdxDecoder`] — incremental decoder fed with chunks of any size
//! - [`ChunkSource`] / [`GzChunkReader`] — plain or gzip input streams
//! - [`SampleDataset`] — paired label/image tensors with normalized samples
//! - [`Observer`] — injected sink for decode and load diagnostics
//   - Encoder for writing tensors back out (fixtures, generated data)
//   - MNIST split helpers and a seeded synthetic generator

pub mod config;
pub mod dataset;
pub mod decoder;
pub mod encode;
pub mod error;
pub mod mnist;
pub mod observer;
pub mod reader;

pub use config::{DecoderConfig, LoadConfig};
pub use dataset::{Dataset, Sample, SampleDataset, SampleFlags};
pub use decoder::{decode_bytes, decode_file, decode_source, DecodeState, IdxDecoder, IDX_MAGIC};
pub use encode::{encode_tensor, write_tensor, write_tensor_file};
pub use error::{DecodeError, LoadError};
pub use mnist::MnistSplit;
pub use observer::{default_observer, Event, NullObserver, Observer, TensorRole, TracingObserver};
pub use reader::{ChunkSource, GzChunkReader};
