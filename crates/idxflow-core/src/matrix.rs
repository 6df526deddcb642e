// Matrix — row-major f32 buffer handed to consumers
//
// Samples carry their image as a Matrix so downstream numeric code gets a
// plain `rows × cols` buffer it owns outright. Nothing in here aliases the
// tensor store.

use std::fmt::Write as _;

use crate::error::{Error, Result};

/// A dense row-major matrix of `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// A `rows × cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::ElementCountMismatch {
                shape: (rows, cols).into(),
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Map unsigned bytes into `[0.0, 1.0]` by dividing by 255.
    pub fn from_normalized_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Result<Self> {
        let data = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();
        Self::from_vec(rows, cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Element at (`row`, `col`), or `None` if out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        Some(&self.data[start..start + self.cols])
    }

    /// Render as 256-colour ANSI background cells using the 24-step
    /// grayscale ramp (colours 232..=255), two spaces per cell so pixels
    /// come out roughly square. Values are clamped to `[0, 1]`.
    pub fn to_ansi_grayscale(&self) -> String {
        let mut out = String::with_capacity(self.data.len() * 12 + self.rows);
        for r in 0..self.rows {
            for &v in &self.data[r * self.cols..(r + 1) * self.cols] {
                let color = 232 + (v.clamp(0.0, 1.0) * 23.0) as u8;
                let _ = write!(out, "\x1b[48;5;{color}m  ");
            }
            out.push('\n');
        }
        out.push_str("\x1b[0m");
        out
    }
}
