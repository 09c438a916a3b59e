use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};

/// Dense row-major matrix indexed by `(row, column)`.
///
/// Rows are time steps (ticks or frames) and columns are pitches or pitch classes.
/// Grids are built once and handed across module boundaries by value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Grid<T = u8> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Builds a grid from explicit rows, every row must have the same length.
    /// An empty row list yields a `0 x cols` grid.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R], cols: usize) -> CodecResult<Self> {
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(CodecError::RaggedRows {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact(0) panics, a zero-column grid has no meaningful rows anyway
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U: Copy + Default, F: Fn(T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines two grids of the same shape cell by cell.
    pub fn zip_with<F: Fn(T, T) -> T>(&self, other: &Grid<T>, f: F) -> CodecResult<Self> {
        if self.shape() != other.shape() {
            return Err(CodecError::ShapeMismatch {
                hold: self.shape(),
                hit: other.shape(),
            });
        }

        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}
