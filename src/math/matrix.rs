use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::error::{NetError, Result};

/// Row-major matrix. For a layer, row `n` holds the incoming weights of node
/// `n` and column `k` corresponds to input `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Samples every entry uniformly from `[low, high)`.
    ///
    /// Callers validate the range first; `low < high` is required.
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, low: f64, high: f64, rng: &mut R) -> Matrix {
        let dist = Uniform::new(low, high);
        let mut res = Matrix::zeros(rows, cols);

        for row in res.data.iter_mut() {
            for value in row.iter_mut() {
                *value = dist.sample(rng);
            }
        }

        res
    }

    /// Builds a matrix from rows, rejecting ragged input.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map_or(0, |r| r.len());
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(NetError::shape(format!("matrix row {i}"), cols, row.len()));
            }
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.iter().map(|r| r.as_slice())
    }

    /// Column `k` as a fresh vector.
    pub fn column(&self, k: usize) -> Vec<f64> {
        self.data.iter().map(|r| r[k]).collect()
    }

    /// Appends zero columns or drops trailing columns until every row has
    /// `new_cols` entries.
    pub fn resize_cols(&mut self, new_cols: usize) {
        for row in self.data.iter_mut() {
            row.resize(new_cols, 0.0);
        }
        self.cols = new_cols;
    }

    pub fn fill(&mut self, value: f64) {
        for row in self.data.iter_mut() {
            row.iter_mut().for_each(|x| *x = value);
        }
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().flatten().all(|&x| x == 0.0)
    }

    pub fn all_finite(&self) -> bool {
        self.data.iter().flatten().all(|x| x.is_finite())
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
