//! Compressed sparse row (CSR) matrix for term-document data.
//!
//! TF-IDF rows have a few hundred non-zeros out of tens of thousands of
//! columns, so every consumer (K-means, silhouette, PCA) works row by row
//! against dense `ndarray` vectors instead of densifying the matrix.

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, DataMut, Ix1};

#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_cols: usize,
    /// row `i` occupies `indices[indptr[i]..indptr[i + 1]]`
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from per-row `(column, value)` lists. Columns within a row
    /// are sorted; zero values are dropped.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f64)>>) -> Self {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);

        for mut row in rows {
            row.sort_unstable_by_key(|&(col, _)| col);
            for (col, value) in row {
                debug_assert!(col < n_cols, "column {col} out of bounds");
                if value != 0.0 {
                    indices.push(col);
                    values.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            n_cols,
            indptr,
            indices,
            values,
        }
    }

    pub fn from_dense(dense: &Array2<f64>) -> Self {
        let rows = dense
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &v)| v != 0.0)
                    .map(|(c, &v)| (c, v))
                    .collect()
            })
            .collect();
        Self::from_rows(dense.ncols(), rows)
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        (&self.indices[start..end], &self.values[start..end])
    }

    pub fn row_sq_norm(&self, i: usize) -> f64 {
        self.row(i).1.iter().map(|v| v * v).sum()
    }

    /// All squared row norms.
    pub fn row_sq_norms(&self) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.row_sq_norm(i)).collect()
    }

    pub fn row_dot(&self, i: usize, dense: ArrayView1<'_, f64>) -> f64 {
        let (cols, vals) = self.row(i);
        cols.iter().zip(vals).map(|(&c, &v)| v * dense[c]).sum()
    }

    /// Dot product of two rows (sorted merge).
    pub fn rows_dot(&self, i: usize, j: usize) -> f64 {
        let (ci, vi) = self.row(i);
        let (cj, vj) = self.row(j);
        let (mut a, mut b) = (0usize, 0usize);
        let mut dot = 0.0;
        while a < ci.len() && b < cj.len() {
            match ci[a].cmp(&cj[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    dot += vi[a] * vj[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        dot
    }

    /// `out += scale * row_i`
    pub fn add_row_to<S>(&self, i: usize, scale: f64, out: &mut ArrayBase<S, Ix1>)
    where
        S: DataMut<Elem = f64>,
    {
        let (cols, vals) = self.row(i);
        for (&c, &v) in cols.iter().zip(vals) {
            out[c] += scale * v;
        }
    }

    /// Keep only the listed rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let selected = rows
            .iter()
            .map(|&i| {
                let (cols, vals) = self.row(i);
                cols.iter().copied().zip(vals.iter().copied()).collect()
            })
            .collect();
        Self::from_rows(self.n_cols, selected)
    }

    /// `X v` for a dense column vector `v`.
    pub fn mul_vec(&self, v: ArrayView1<'_, f64>) -> Array1<f64> {
        Array1::from_iter((0..self.n_rows()).map(|i| self.row_dot(i, v)))
    }

    /// `Xᵀ u` for a dense vector `u` with one entry per row.
    pub fn transpose_mul_vec(&self, u: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut out = Array1::<f64>::zeros(self.n_cols);
        for i in 0..self.n_rows() {
            self.add_row_to(i, u[i], &mut out);
        }
        out
    }

    pub fn column_means(&self) -> Array1<f64> {
        let mut sums = Array1::<f64>::zeros(self.n_cols);
        for i in 0..self.n_rows() {
            self.add_row_to(i, 1.0, &mut sums);
        }
        if self.n_rows() > 0 {
            sums /= self.n_rows() as f64;
        }
        sums
    }

    /// Mean over columns of the per-column (population) variance.
    pub fn mean_column_variance(&self) -> f64 {
        let n = self.n_rows();
        if n == 0 || self.n_cols == 0 {
            return 0.0;
        }
        let means = self.column_means();
        let mut sq_sums = Array1::<f64>::zeros(self.n_cols);
        for (&c, &v) in self.indices.iter().zip(&self.values) {
            sq_sums[c] += v * v;
        }
        let total: f64 = sq_sums
            .iter()
            .zip(means.iter())
            .map(|(&sq, &m)| (sq / n as f64 - m * m).max(0.0))
            .sum();
        total / self.n_cols as f64
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows(), self.n_cols));
        for i in 0..self.n_rows() {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                dense[[i, c]] = v;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> CsrMatrix {
        CsrMatrix::from_dense(&array![[1.0, 0.0, 2.0], [0.0, 0.0, 0.0], [0.0, 3.0, 4.0]])
    }

    #[test]
    fn test_shape_and_rows() {
        let m = sample();
        assert_eq!((m.n_rows(), m.n_cols(), m.nnz()), (3, 3, 4));
        assert_eq!(m.row(0), (&[0usize, 2][..], &[1.0, 2.0][..]));
        assert_eq!(m.row(1).0.len(), 0);
    }

    #[test]
    fn test_from_rows_sorts_and_drops_zeros() {
        let m = CsrMatrix::from_rows(4, vec![vec![(3, 1.0), (0, 2.0), (1, 0.0)]]);
        assert_eq!(m.row(0), (&[0usize, 3][..], &[2.0, 1.0][..]));
    }

    #[test]
    fn test_dot_products() {
        let m = sample();
        assert_eq!(m.rows_dot(0, 2), 8.0);
        assert_eq!(m.row_sq_norm(2), 25.0);
        assert_eq!(m.row_dot(0, array![1.0, 1.0, 1.0].view()), 3.0);
    }

    #[test]
    fn test_matrix_vector_products_match_dense() {
        let m = sample();
        let dense = m.to_dense();
        let v = array![0.5, -1.0, 2.0];
        assert_eq!(m.mul_vec(v.view()), dense.dot(&v));
        let u = array![1.0, 2.0, -1.0];
        assert_eq!(m.transpose_mul_vec(u.view()), dense.t().dot(&u));
    }

    #[test]
    fn test_select_rows_and_means() {
        let m = sample();
        let s = m.select_rows(&[2, 0]);
        assert_eq!(s.to_dense(), array![[0.0, 3.0, 4.0], [1.0, 0.0, 2.0]]);
        assert_eq!(s.column_means(), array![0.5, 1.5, 3.0]);
        // variances: 0.25, 2.25, 1.0
        assert!((s.mean_column_variance() - 3.5 / 3.0).abs() < 1e-12);
    }
}
