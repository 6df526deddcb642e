// Chunk sources — where decoder input comes from
//
// The decoder only needs "give me the next chunk, or 0 at end of stream".
// Anything implementing `std::io::Read` qualifies. `GzChunkReader` adds
// transparent gzip handling: if a file starts with the gzip magic it is
// inflated on the fly, otherwise the bytes pass straight through, the same
// way `gzopen` treats uncompressed files.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A forward-only source of byte chunks.
pub trait ChunkSource {
    /// Fill some prefix of `buf` and return its length. `Ok(0)` means end
    /// of stream.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read + ?Sized> ChunkSource for R {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

/// Reads plain or gzip-compressed data, deciding from the first two bytes.
pub struct GzChunkReader {
    inner: Box<dyn Read + Send>,
    compressed: bool,
}

impl GzChunkReader {
    /// Open a file for decoding.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }

    /// Wrap any reader, sniffing the gzip magic.
    pub fn new<R: Read + Send + 'static>(mut reader: R) -> io::Result<Self> {
        let mut head = [0u8; 2];
        let mut filled = 0;
        while filled < head.len() {
            let n = reader.read_chunk(&mut head[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        let prefixed = Cursor::new(head[..filled].to_vec()).chain(reader);
        let compressed = filled == GZIP_MAGIC.len() && head == GZIP_MAGIC;
        let inner: Box<dyn Read + Send> = if compressed {
            Box::new(MultiGzDecoder::new(prefixed))
        } else {
            Box::new(prefixed)
        };
        Ok(Self { inner, compressed })
    }

    /// Whether the stream is being inflated.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl Read for GzChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl std::fmt::Debug for GzChunkReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzChunkReader")
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}
