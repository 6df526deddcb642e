// IDX encoding
//
// The inverse of the decoder, used to produce fixtures and to write
// generated datasets back out in the same format the loaders read.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use idxflow_core::IdxTensor;

use crate::decoder::IDX_MAGIC;

/// Serialize a tensor: magic, dimension words, then the raw payload.
///
/// Fails only when the tensor cannot be represented in the format (see
/// [`write_tensor`]).
pub fn encode_tensor(tensor: &IdxTensor) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(4 + 4 * tensor.rank() + tensor.elem_count());
    write_tensor(&mut buf, tensor)?;
    Ok(buf)
}

/// Write a tensor to any sink.
///
/// Returns `InvalidInput` if the rank does not fit the header byte or an
/// extent does not fit in a u32 dimension word.
pub fn write_tensor<W: Write>(mut w: W, tensor: &IdxTensor) -> io::Result<()> {
    let rank = u8::try_from(tensor.rank())
        .ok()
        .filter(|&r| r > 0)
        .ok_or_else(|| invalid_input(format!("IDX rank must be 1..=255, got {}", tensor.rank())))?;
    let dims = tensor
        .dims()
        .iter()
        .map(|&d| {
            u32::try_from(d)
                .map_err(|_| invalid_input(format!("IDX dimension {d} does not fit in a u32")))
        })
        .collect::<io::Result<Vec<u32>>>()?;

    w.write_all(&(IDX_MAGIC | u32::from(rank)).to_be_bytes())?;
    for d in dims {
        w.write_all(&d.to_be_bytes())?;
    }
    w.write_all(tensor.as_bytes())
}

fn invalid_input(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

/// Write a tensor to `path`, gzip-compressed when `gzip` is set.
pub fn write_tensor_file(path: impl AsRef<Path>, tensor: &IdxTensor, gzip: bool) -> io::Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    if gzip {
        let mut enc = GzEncoder::new(file, Compression::default());
        write_tensor(&mut enc, tensor)?;
        enc.finish()?.flush()
    } else {
        let mut file = file;
        write_tensor(&mut file, tensor)?;
        file.flush()
    }
}

/// Build IDX3 image bytes from raw image data (useful for tests).
pub fn build_idx3_bytes(images: &[&[u8]], rows: u32, cols: u32) -> Vec<u8> {
    let count = images.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&(IDX_MAGIC | 3).to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&rows.to_be_bytes());
    buf.extend_from_slice(&cols.to_be_bytes());
    for img in images {
        buf.extend_from_slice(img);
    }
    buf
}

/// Build IDX1 label bytes (useful for tests).
pub fn build_idx1_bytes(labels: &[u8]) -> Vec<u8> {
    let count = labels.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&(IDX_MAGIC | 1).to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(labels);
    buf
}
