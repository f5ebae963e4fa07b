//! Dense row-major matrices of `f64`.
//!
//! Every binary operation checks shapes and fails with a [`MatrixError`]
//! instead of reshaping. All operations allocate a new matrix; in-place
//! mutation is left to the network, which replaces whole layers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape violations between matrices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("cannot {op} a {}x{} matrix with a {}x{} matrix", left.0, left.1, right.0, right.1)]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("cannot take the dot product of a {}x{} matrix and a {}x{} matrix", left.0, left.1, right.0, right.1)]
    DotMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("requested {requested} rows from a matrix with {available}")]
    RowRange { requested: usize, available: usize },

    #[error("a {rows}x{columns} matrix needs {} cells, found {found}", rows * columns)]
    CellCount {
        rows: usize,
        columns: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

/// Serialized form of a [`Matrix`], checked before it becomes one.
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = MatrixError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        if raw.rows.checked_mul(raw.columns) != Some(raw.data.len()) {
            return Err(MatrixError::CellCount {
                rows: raw.rows,
                columns: raw.columns,
                found: raw.data.len(),
            });
        }
        Ok(Self {
            rows: raw.rows,
            columns: raw.columns,
            data: raw.data,
        })
    }
}

impl Matrix {
    /// Zero-filled matrix.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![0.0; rows * columns],
        }
    }

    /// Matrix with every cell drawn uniformly from [-1, 1).
    pub fn random(rows: usize, columns: usize) -> Self {
        Self::random_with(rows, columns, &mut rand::thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(rows: usize, columns: usize, rng: &mut R) -> Self {
        let data = (0..rows * columns)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        Self {
            rows,
            columns,
            data,
        }
    }

    /// Builds a matrix from rows, rejecting ragged input.
    ///
    /// An empty list of rows yields a 0x0 matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * columns);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(MatrixError::Ragged {
                    row: index,
                    expected: columns,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            data,
        })
    }

    /// Single-row matrix holding `values`.
    pub fn row_vector(values: &[f64]) -> Self {
        Self {
            rows: 1,
            columns: values.len(),
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.columns + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.columns..(i + 1) * self.columns]
    }

    /// Iterates over all cells in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Copy of the first `count` rows.
    pub fn first_rows(&self, count: usize) -> Result<Matrix, MatrixError> {
        if count > self.rows {
            return Err(MatrixError::RowRange {
                requested: count,
                available: self.rows,
            });
        }
        Ok(Self {
            rows: count,
            columns: self.columns,
            data: self.data[..count * self.columns].to_vec(),
        })
    }

    /// Copy with an all-zero row inserted before the first row.
    pub fn with_leading_zero_row(&self) -> Matrix {
        let mut data = vec![0.0; self.columns];
        data.extend_from_slice(&self.data);
        Self {
            rows: self.rows + 1,
            columns: self.columns,
            data,
        }
    }

    /// Applies `f(i, j, x)` to every cell.
    pub fn map_indexed<F>(&self, mut f: F) -> Matrix
    where
        F: FnMut(usize, usize, f64) -> f64,
    {
        let columns = self.columns;
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(k, &x)| f(k / columns.max(1), k % columns.max(1), x))
            .collect();
        Self {
            rows: self.rows,
            columns,
            data,
        }
    }

    /// Applies `f(x)` to every cell.
    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Self {
            rows: self.rows,
            columns: self.columns,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| factor * x)
    }

    /// Standard matrix product; requires `self.columns() == other.rows()`.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.columns != other.rows {
            return Err(MatrixError::DotMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut result = Matrix::zeros(self.rows, other.columns);
        for i in 0..self.rows {
            for k in 0..self.columns {
                let a = self.data[i * self.columns + k];
                let row = &other.data[k * other.columns..(k + 1) * other.columns];
                let out = &mut result.data[i * other.columns..(i + 1) * other.columns];
                for (o, &b) in out.iter_mut().zip(row) {
                    *o += a * b;
                }
            }
        }
        Ok(result)
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with("add", other, |a, b| a + b)
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with("subtract", other, |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with("multiply", other, |a, b| a * b)
    }

    pub fn transpose(&self) -> Matrix {
        let mut result = Matrix::zeros(self.columns, self.rows);
        for i in 0..self.rows {
            for j in 0..self.columns {
                result.data[j * self.rows + i] = self.data[i * self.columns + j];
            }
        }
        result
    }

    fn zip_with<F>(&self, op: &'static str, other: &Matrix, f: F) -> Result<Matrix, MatrixError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != other.shape() {
            return Err(MatrixError::ShapeMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(Self {
            rows: self.rows,
            columns: self.columns,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}
