use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::{AddAssign, Mul, SubAssign};

use crate::error::{Error, Result};

/// Dense row-major matrix. A layer's weights are stored as `outputs × inputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Samples every entry uniformly from `[-range, range]`.
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, range: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = super::vector::sample_uniform(range, rng);
            }
        }

        res
    }

    /// Builds a matrix from row vectors, rejecting ragged input.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map_or(0, |row| row.len());
        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(Error::mismatch("matrix row", cols, bad.len()));
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// `M · v`
    pub fn mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.cols {
            return Err(Error::mismatch("matrix-vector product", self.cols, v.len()));
        }
        Ok(self
            .data
            .iter()
            .map(|row| row.iter().zip(v).map(|(w, x)| w * x).sum())
            .collect())
    }

    /// `Mᵀ · v` without materializing the transpose.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.rows {
            return Err(Error::mismatch("transposed matrix-vector product", self.rows, v.len()));
        }
        let mut res = vec![0.0; self.cols];
        for (row, &scale) in self.data.iter().zip(v) {
            for (acc, &w) in res.iter_mut().zip(row) {
                *acc += w * scale;
            }
        }
        Ok(res)
    }

    /// Outer product `a ⊗ b`, shape `a.len() × b.len()`.
    pub fn outer(a: &[f64], b: &[f64]) -> Matrix {
        Matrix {
            rows: a.len(),
            cols: b.len(),
            data: a
                .iter()
                .map(|&x| b.iter().map(|&y| x * y).collect())
                .collect(),
        }
    }

    /// Sets every entry to zero, keeping the shape.
    pub fn clear(&mut self) {
        for row in &mut self.data {
            row.iter_mut().for_each(|x| *x = 0.0);
        }
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        if !self.same_shape(rhs) {
            panic!("Matrices are of incorrect sizes")
        }

        for (row, rhs_row) in self.data.iter_mut().zip(&rhs.data) {
            for (x, y) in row.iter_mut().zip(rhs_row) {
                *x += y;
            }
        }
    }
}

impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        if !self.same_shape(rhs) {
            panic!("Matrices are of incorrect sizes")
        }

        for (row, rhs_row) in self.data.iter_mut().zip(&rhs.data) {
            for (x, y) in row.iter_mut().zip(rhs_row) {
                *x -= y;
            }
        }
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, scale: f64) -> Self::Output {
        self.map(|x| x * scale)
    }
}
