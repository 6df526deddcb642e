// IdxDecoder — incremental IDX parser
//
// IDX format (all header values big-endian u32):
//
//   offset 0:          magic = 0x000008RR        (RR = rank, 1..=255)
//   offset 4 + 4*i:    dim[i]                    for i in 0..rank
//   offset 4 + 4*rank: product(dims) raw bytes, row-major
//
// The decoder owns no I/O. Callers push chunks of any size with `feed` and
// close the stream with `finish`. Parsing runs as a small state machine:
//
//   AwaitingMagic → ReadingDimensions(i) → ReadingPayload → Complete
//                 ↘            ↘                 ↘
//                              Failed
//
// Header words need 4 contiguous bytes. When a chunk ends in the middle of
// a word, the 1–3 leftover bytes go into a carry buffer and are completed
// from the front of the next chunk, so the result never depends on where
// the caller happened to slice the stream. Payload bytes have no such
// requirement and are copied straight into the tensor buffer.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use idxflow_core::{IdxTensor, Shape};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::observer::{default_observer, Event, Observer};
use crate::reader::{ChunkSource, GzChunkReader};

/// Magic word with the rank byte masked out.
pub const IDX_MAGIC: u32 = 0x0000_0800;
const MAGIC_MASK: u32 = 0xFFFF_FF00;
const WORD: usize = 4;

/// Where the decoder is in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    AwaitingMagic,
    /// Waiting for dimension word `i`.
    ReadingDimensions(usize),
    ReadingPayload,
    Complete,
    Failed,
}

/// Streaming decoder for a single IDX tensor.
pub struct IdxDecoder {
    config: DecoderConfig,
    observer: Arc<dyn Observer>,
    state: DecodeState,
    rank: u8,
    dims: Vec<u32>,
    header_values_read: usize,
    total: usize,
    payload: Vec<u8>,
    carry: [u8; WORD],
    carry_len: usize,
    failure: Option<DecodeError>,
}

impl Default for IdxDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default(), default_observer())
    }
}

impl IdxDecoder {
    pub fn new(config: DecoderConfig, observer: Arc<dyn Observer>) -> Self {
        Self {
            config,
            observer,
            state: DecodeState::AwaitingMagic,
            rank: 0,
            dims: Vec::new(),
            header_values_read: 0,
            total: 0,
            payload: Vec::new(),
            carry: [0; WORD],
            carry_len: 0,
            failure: None,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Header words consumed so far, the magic word included.
    pub fn header_values_read(&self) -> usize {
        self.header_values_read
    }

    /// Payload bytes consumed so far.
    pub fn values_read(&self) -> usize {
        self.payload.len()
    }

    pub fn is_complete(&self) -> bool {
        self.state == DecodeState::Complete
    }

    /// Push the next chunk of the stream.
    ///
    /// Returns how many bytes of `chunk` were accepted. Everything is
    /// accepted while the tensor is incomplete (partial header words are
    /// held internally); bytes after the end of the payload are not.
    ///
    /// A failure is terminal: the same error is returned from every later
    /// call and from [`IdxDecoder::finish`].
    pub fn feed(&mut self, chunk: &[u8]) -> Result<usize, DecodeError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let mut accepted = 0;
        if self.carry_len > 0 {
            let take = (WORD - self.carry_len).min(chunk.len());
            self.carry[self.carry_len..self.carry_len + take].copy_from_slice(&chunk[..take]);
            self.carry_len += take;
            accepted += take;
            if self.carry_len < WORD {
                return Ok(accepted);
            }
            let word = self.carry;
            self.carry_len = 0;
            self.step(&word)?;
        }

        let mut rest = &chunk[accepted..];
        loop {
            let consumed = self.step(rest)?;
            if consumed == 0 {
                break;
            }
            rest = &rest[consumed..];
            accepted += consumed;
        }

        if !rest.is_empty() {
            if self.in_header() {
                // fewer than WORD bytes left, otherwise `step` would have taken them
                self.carry[..rest.len()].copy_from_slice(rest);
                self.carry_len = rest.len();
                accepted += rest.len();
            } else {
                self.observer
                    .on_event(&Event::TrailingBytes { count: rest.len() });
            }
        }

        Ok(accepted)
    }

    /// Close the stream and take the tensor.
    ///
    /// Succeeds only if the full header and exactly `product(dims)` payload
    /// bytes were seen. The decoder is consumed either way, so a partial
    /// tensor can never escape.
    pub fn finish(self) -> Result<IdxTensor, DecodeError> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        if self.state != DecodeState::Complete {
            let values_read = self.payload.len();
            self.observer.on_event(&Event::Incomplete {
                header_values_read: self.header_values_read,
                values_read,
            });
            return Err(DecodeError::Incomplete {
                header_values_read: self.header_values_read,
                expected_header_values: self.rank as usize + 1,
                values_read,
                expected_values: self.total,
            });
        }

        let tensor = IdxTensor::new(Shape::from_u32_dims(&self.dims), self.payload)?;
        self.observer.on_event(&Event::Complete {
            shape: tensor.shape().clone(),
        });
        Ok(tensor)
    }

    fn in_header(&self) -> bool {
        matches!(
            self.state,
            DecodeState::AwaitingMagic | DecodeState::ReadingDimensions(_)
        )
    }

    /// Consume as much of `input` as the current state allows in one go:
    /// one header word, or a run of payload bytes. Returns 0 when nothing
    /// can be consumed.
    fn step(&mut self, input: &[u8]) -> Result<usize, DecodeError> {
        match self.state {
            DecodeState::AwaitingMagic | DecodeState::ReadingDimensions(_) => {
                let Some(word) = input.get(..WORD) else {
                    return Ok(0);
                };
                let value = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
                self.read_header_value(value)?;
                Ok(WORD)
            }
            DecodeState::ReadingPayload => {
                let remaining = self.total - self.payload.len();
                let n = remaining.min(input.len());
                self.payload.extend_from_slice(&input[..n]);
                if self.payload.len() == self.total {
                    self.state = DecodeState::Complete;
                }
                Ok(n)
            }
            DecodeState::Complete | DecodeState::Failed => Ok(0),
        }
    }

    fn read_header_value(&mut self, value: u32) -> Result<(), DecodeError> {
        match self.state {
            DecodeState::AwaitingMagic => {
                let rank = (value & 0xFF) as u8;
                if value & MAGIC_MASK != IDX_MAGIC || rank == 0 {
                    self.observer
                        .on_event(&Event::InvalidHeader { magic: value });
                    return Err(self.fail(DecodeError::InvalidHeader { magic: value }));
                }
                self.rank = rank;
                self.dims = Vec::with_capacity(rank as usize);
                self.header_values_read = 1;
                self.observer.on_event(&Event::RankRead { rank });
                self.state = DecodeState::ReadingDimensions(0);
            }
            DecodeState::ReadingDimensions(index) => {
                self.dims.push(value);
                self.header_values_read += 1;
                self.observer.on_event(&Event::DimensionRead {
                    index,
                    extent: value,
                });
                if index + 1 < self.rank as usize {
                    self.state = DecodeState::ReadingDimensions(index + 1);
                } else {
                    self.begin_payload()?;
                }
            }
            _ => unreachable!("header value read outside the header phase"),
        }
        Ok(())
    }

    fn begin_payload(&mut self) -> Result<(), DecodeError> {
        let total = match Shape::from_u32_dims(&self.dims).checked_elem_count() {
            Some(total) => total,
            None => {
                let dims = self.dims.clone();
                return Err(self.fail(DecodeError::ShapeOverflow { dims }));
            }
        };
        if self.config.max_payload_bytes.is_some_and(|limit| total > limit)
            || self.payload.try_reserve_exact(total).is_err()
        {
            return Err(self.fail(DecodeError::OutOfMemory { requested: total }));
        }

        self.total = total;
        self.observer
            .on_event(&Event::PayloadAllocated { bytes: total });
        self.state = if total == 0 {
            DecodeState::Complete
        } else {
            DecodeState::ReadingPayload
        };
        Ok(())
    }

    fn fail(&mut self, err: DecodeError) -> DecodeError {
        self.state = DecodeState::Failed;
        self.payload = Vec::new();
        self.carry_len = 0;
        self.failure = Some(err.clone());
        err
    }
}

impl std::fmt::Debug for IdxDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdxDecoder")
            .field("state", &self.state)
            .field("rank", &self.rank)
            .field("dims", &self.dims)
            .field("header_values_read", &self.header_values_read)
            .field("values_read", &self.payload.len())
            .field("total", &self.total)
            .field("carry_len", &self.carry_len)
            .finish()
    }
}

// Drivers

/// Decode a tensor held entirely in memory.
pub fn decode_bytes(bytes: &[u8]) -> Result<IdxTensor, DecodeError> {
    let mut decoder = IdxDecoder::default();
    decoder.feed(bytes)?;
    decoder.finish()
}

/// Pull chunks of `config.read_buffer_size` bytes from `source` until end
/// of stream and decode them.
pub fn decode_source<S: ChunkSource + ?Sized>(
    source: &mut S,
    config: DecoderConfig,
    observer: Arc<dyn Observer>,
) -> Result<IdxTensor, DecodeError> {
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];
    let mut decoder = IdxDecoder::new(config, observer);
    loop {
        let n = source.read_chunk(&mut buf)?;
        if n == 0 {
            break;
        }
        decoder.feed(&buf[..n])?;
    }
    decoder.finish()
}

/// Open `path` (plain or gzip) and decode it.
///
/// A file that cannot be opened is reported as [`DecodeError::Open`]; read
/// failures after that are [`DecodeError::Io`].
pub fn decode_file(
    path: impl AsRef<Path>,
    config: DecoderConfig,
    observer: Arc<dyn Observer>,
) -> Result<IdxTensor, DecodeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DecodeError::Open {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })?;
    let mut reader = GzChunkReader::new(BufReader::new(file))?;
    decode_source(&mut reader, config, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use std::sync::Mutex;

    fn idx(dims: &[u32], payload: &[u8]) -> Vec<u8> {
        let mut buf = (IDX_MAGIC | dims.len() as u32).to_be_bytes().to_vec();
        for d in dims {
            buf.extend_from_slice(&d.to_be_bytes());
        }
        buf.extend_from_slice(payload);
        buf
    }

    fn quiet() -> IdxDecoder {
        IdxDecoder::new(DecoderConfig::default(), Arc::new(NullObserver))
    }

    #[test]
    fn test_decode_rank1() {
        let bytes = idx(&[5], &[0, 64, 128, 192, 255]);
        let t = decode_bytes(&bytes).unwrap();
        assert_eq!(t.dims(), &[5]);
        assert_eq!(t.as_bytes(), &[0, 64, 128, 192, 255]);
    }

    #[test]
    fn test_state_progression() {
        let bytes = idx(&[2, 2], &[1, 2, 3, 4]);
        let mut d = quiet();
        assert_eq!(d.state(), DecodeState::AwaitingMagic);
        d.feed(&bytes[..4]).unwrap();
        assert_eq!(d.state(), DecodeState::ReadingDimensions(0));
        d.feed(&bytes[4..8]).unwrap();
        assert_eq!(d.state(), DecodeState::ReadingDimensions(1));
        d.feed(&bytes[8..12]).unwrap();
        assert_eq!(d.state(), DecodeState::ReadingPayload);
        assert_eq!(d.header_values_read(), 3);
        d.feed(&bytes[12..14]).unwrap();
        assert_eq!(d.values_read(), 2);
        d.feed(&bytes[14..]).unwrap();
        assert!(d.is_complete());
        assert_eq!(d.finish().unwrap().as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_header_word_split_across_chunks() {
        let bytes = idx(&[3], &[7, 8, 9]);
        let mut d = quiet();
        assert_eq!(d.feed(&bytes[..3]).unwrap(), 3);
        assert_eq!(d.state(), DecodeState::AwaitingMagic);
        assert_eq!(d.feed(&bytes[3..6]).unwrap(), 3);
        assert_eq!(d.state(), DecodeState::ReadingDimensions(0));
        assert_eq!(d.feed(&bytes[6..]).unwrap(), bytes.len() - 6);
        assert_eq!(d.finish().unwrap().as_bytes(), &[7, 8, 9]);
    }

    #[test]
    fn test_one_byte_chunks() {
        let payload: Vec<u8> = (0..24).collect();
        let bytes = idx(&[2, 3, 4], &payload);
        let mut d = quiet();
        for b in &bytes {
            assert_eq!(d.feed(std::slice::from_ref(b)).unwrap(), 1);
        }
        let t = d.finish().unwrap();
        assert_eq!(t.dims(), &[2, 3, 4]);
        assert_eq!(t.as_bytes(), payload.as_slice());
    }

    #[test]
    fn test_empty_chunks_are_harmless() {
        let bytes = idx(&[1], &[42]);
        let mut d = quiet();
        assert_eq!(d.feed(&[]).unwrap(), 0);
        d.feed(&bytes[..2]).unwrap();
        assert_eq!(d.feed(&[]).unwrap(), 0);
        d.feed(&bytes[2..]).unwrap();
        assert_eq!(d.finish().unwrap().as_bytes(), &[42]);
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = idx(&[2], &[1, 2]);
        bytes[2] = 0x09;
        let mut d = quiet();
        let err = d.feed(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHeader { magic: 0x0901 }));
        assert_eq!(d.state(), DecodeState::Failed);
        assert_eq!(d.values_read(), 0);
        // terminal: later input is refused with the same error
        assert!(matches!(
            d.feed(&[0; 8]),
            Err(DecodeError::InvalidHeader { magic: 0x0901 })
        ));
        assert!(matches!(
            d.finish(),
            Err(DecodeError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_zero_rank() {
        let err = decode_bytes(&[0, 0, 8, 0, 0, 0, 0, 1]).unwrap_err();
        assert!(err.is_zero_rank());
    }

    #[test]
    fn test_incomplete_payload() {
        let bytes = idx(&[10], &[1; 7]);
        let err = decode_bytes(&bytes).unwrap_err();
        match err {
            DecodeError::Incomplete {
                header_values_read,
                expected_header_values,
                values_read,
                expected_values,
            } => {
                assert_eq!(header_values_read, 2);
                assert_eq!(expected_header_values, 2);
                assert_eq!(values_read, 7);
                assert_eq!(expected_values, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_incomplete_header() {
        let bytes = idx(&[2, 2], &[0; 4]);
        let mut d = quiet();
        d.feed(&bytes[..10]).unwrap();
        assert!(matches!(
            d.finish(),
            Err(DecodeError::Incomplete {
                header_values_read: 2,
                expected_header_values: 3,
                ..
            })
        ));
        assert!(matches!(
            quiet().finish(),
            Err(DecodeError::Incomplete {
                header_values_read: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_zero_sized_payload() {
        let bytes = idx(&[0, 28, 28], &[]);
        let t = decode_bytes(&bytes).unwrap();
        assert_eq!(t.dims(), &[0, 28, 28]);
        assert_eq!(t.elem_count(), 0);
    }

    #[test]
    fn test_trailing_bytes_not_accepted() {
        let mut bytes = idx(&[2], &[5, 6]);
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let mut d = quiet();
        assert_eq!(d.feed(&bytes).unwrap(), bytes.len() - 3);
        assert_eq!(d.feed(&[1, 2]).unwrap(), 0);
        assert_eq!(d.finish().unwrap().as_bytes(), &[5, 6]);
    }

    #[test]
    fn test_payload_limit() {
        let bytes = idx(&[100], &[0; 100]);
        let mut d = IdxDecoder::new(
            DecoderConfig::default().max_payload_bytes(99),
            Arc::new(NullObserver),
        );
        assert!(matches!(
            d.feed(&bytes),
            Err(DecodeError::OutOfMemory { requested: 100 })
        ));
    }

    #[test]
    fn test_events_reported() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut d = IdxDecoder::new(
            DecoderConfig::default(),
            Arc::new(move |e: &Event| sink.lock().unwrap().push(e.clone())),
        );
        d.feed(&idx(&[2], &[1, 2])).unwrap();
        d.finish().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Event::RankRead { rank: 1 },
                Event::DimensionRead {
                    index: 0,
                    extent: 2
                },
                Event::PayloadAllocated { bytes: 2 },
                Event::Complete {
                    shape: Shape::from(2)
                },
            ]
        );
    }

    #[test]
    fn test_decode_source_small_buffer() {
        let payload: Vec<u8> = (0..=255).collect();
        let bytes = idx(&[16, 16], &payload);
        for size in [1, 3, 5, 256, 4096] {
            let mut src = std::io::Cursor::new(bytes.clone());
            let t = decode_source(
                &mut src,
                DecoderConfig::default().read_buffer_size(size),
                Arc::new(NullObserver),
            )
            .unwrap();
            assert_eq!(t.as_bytes(), payload.as_slice());
        }
    }
}
