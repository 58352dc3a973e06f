// ============================================================
// Layer 5 — Projector (PCA)
// ============================================================
// Projects the TF-IDF matrix onto its leading principal
// components for plotting.
//
// The matrix is never densified or centered in memory. The
// sample covariance is applied implicitly:
//
//   C v = Xcᵀ (Xc v) / (n − 1)     with Xc = X − 1·μᵀ
//   Xc v  = X v − (μ·v)·1
//   Xcᵀ u = Xᵀ u − μ·Σu
//
// Each component comes from power iteration, re-orthogonalised
// against the components already found (deflation). Component
// signs are fixed so the loading of largest magnitude is
// positive, which makes the output independent of the start
// vector.

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::sparse::CsrMatrix;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaConfig {
    pub n_components: usize,
    pub max_iter: usize,
    /// Stop when the component moves less than this between iterations
    pub tol: f64,
    pub seed: u64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            n_components: 2,
            max_iter: 1000,
            tol: 1e-10,
            seed: 42,
        }
    }
}

/// Documents in component space.
#[derive(Debug, Clone)]
pub struct Projection {
    /// n_rows × n_components scores
    pub coords: Array2<f64>,
    pub components: Array2<f64>,
    pub explained_variance: Vec<f64>,
    pub explained_variance_ratio: Vec<f64>,
}

pub struct Projector {
    config: PcaConfig,
}

impl Projector {
    pub fn new(config: PcaConfig) -> Self {
        Self { config }
    }

    pub fn project(&self, x: &CsrMatrix) -> AnalysisResult<Projection> {
        let (n, d) = (x.n_rows(), x.n_cols());
        let n_comp = self.config.n_components;
        if n < 2 {
            return Err(AnalysisError::insufficient(format!(
                "PCA needs at least 2 rows, got {n}"
            )));
        }
        if n_comp == 0 || n_comp > d {
            return Err(AnalysisError::invalid_config(format!(
                "cannot extract {n_comp} components from {d} features"
            )));
        }

        let means = x.column_means();
        let total_variance = total_variance(x, &means);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut components = Array2::<f64>::zeros((n_comp, d));
        let mut variances = Vec::with_capacity(n_comp);

        for j in 0..n_comp {
            let found = components.slice(ndarray::s![..j, ..]).to_owned();
            let (v, lambda, iters) = self.power_iterate(x, &means, &found, &mut rng);
            tracing::debug!("PC{}: variance={:.6} after {} iterations", j + 1, lambda, iters);
            components.row_mut(j).assign(&v);
            variances.push(lambda);
        }

        let mut coords = Array2::<f64>::zeros((n, n_comp));
        for (j, v) in components.rows().into_iter().enumerate() {
            coords.column_mut(j).assign(&centered_mul(x, &means, v));
        }

        let explained_variance_ratio = variances
            .iter()
            .map(|&v| if total_variance > 0.0 { v / total_variance } else { 0.0 })
            .collect::<Vec<_>>();

        tracing::info!(
            "Projected {} documents onto {} components (explained variance ratio {:?})",
            n,
            n_comp,
            explained_variance_ratio
        );

        Ok(Projection {
            coords,
            components,
            explained_variance: variances,
            explained_variance_ratio,
        })
    }

    /// Leading eigenvector of the covariance restricted to the
    /// complement of `found`. Returns (vector, eigenvalue, iterations).
    fn power_iterate(
        &self,
        x: &CsrMatrix,
        means: &Array1<f64>,
        found: &Array2<f64>,
        rng: &mut StdRng,
    ) -> (Array1<f64>, f64, usize) {
        let d = x.n_cols();
        let mut v = Array1::from_iter((0..d).map(|_| rng.gen::<f64>() - 0.5));
        orthogonalise(&mut v, found);
        if !normalise(&mut v) {
            return (v, 0.0, 0);
        }

        let mut iters = 0;
        for iter in 1..=self.config.max_iter {
            iters = iter;
            let mut next = covariance_mul(x, means, v.view());
            orthogonalise(&mut next, found);
            if !normalise(&mut next) {
                // v lies in the null space: no variance left
                return (with_fixed_sign(v), 0.0, iters);
            }
            let delta = (&next - &v).mapv(|e| e * e).sum().sqrt();
            let flipped = (&next + &v).mapv(|e| e * e).sum().sqrt();
            v = next;
            if delta.min(flipped) < self.config.tol {
                break;
            }
        }

        let lambda = v.dot(&covariance_mul(x, means, v.view()));
        (with_fixed_sign(v), lambda.max(0.0), iters)
    }
}

/// Xc v
fn centered_mul(x: &CsrMatrix, means: &Array1<f64>, v: ArrayView1<'_, f64>) -> Array1<f64> {
    let shift = means.dot(&v);
    x.mul_vec(v) - shift
}

/// C v with C the sample covariance of the rows of X.
fn covariance_mul(x: &CsrMatrix, means: &Array1<f64>, v: ArrayView1<'_, f64>) -> Array1<f64> {
    let u = centered_mul(x, means, v);
    let u_sum = u.sum();
    let xtu = x.transpose_mul_vec(u.view());
    (xtu - means * u_sum) / (x.n_rows() - 1) as f64
}

/// Sum of the sample variances of all columns (trace of C).
fn total_variance(x: &CsrMatrix, means: &Array1<f64>) -> f64 {
    let n = x.n_rows() as f64;
    let mut sq_sums = Array1::<f64>::zeros(x.n_cols());
    for i in 0..x.n_rows() {
        let (cols, vals) = x.row(i);
        for (&c, &v) in cols.iter().zip(vals) {
            sq_sums[c] += v * v;
        }
    }
    sq_sums
        .iter()
        .zip(means.iter())
        .map(|(&sq, &m)| (sq - n * m * m).max(0.0))
        .sum::<f64>()
        / (n - 1.0)
}

fn orthogonalise(v: &mut Array1<f64>, basis: &Array2<f64>) {
    for b in basis.rows() {
        let proj = v.dot(&b);
        v.scaled_add(-proj, &b);
    }
}

/// Scales to unit length; false when the vector is (numerically) zero.
fn normalise(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(&*v).sqrt();
    if norm < 1e-300 {
        return false;
    }
    *v /= norm;
    true
}

fn with_fixed_sign(mut v: Array1<f64>) -> Array1<f64> {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |acc, e| if e.abs() > acc.abs() { e } else { acc });
    if pivot < 0.0 {
        v.mapv_inplace(|e| -e);
    }
    v
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    /// Variance 8/3 along the first axis, 2/3 along the second.
    fn cross() -> CsrMatrix {
        CsrMatrix::from_dense(&array![[2.0, 0.0], [-2.0, 0.0], [0.0, 1.0], [0.0, -1.0]])
    }

    #[test]
    fn test_components_follow_the_axes_of_variance() {
        let p = Projector::new(PcaConfig::default()).project(&cross()).unwrap();

        assert!((p.explained_variance[0] - 8.0 / 3.0).abs() < 1e-6);
        assert!((p.explained_variance[1] - 2.0 / 3.0).abs() < 1e-6);
        assert!((p.explained_variance_ratio[0] - 0.8).abs() < 1e-6);
        assert!((p.explained_variance_ratio[1] - 0.2).abs() < 1e-6);

        let expected = array![[2.0, 0.0], [-2.0, 0.0], [0.0, 1.0], [0.0, -1.0]];
        for (a, b) in p.coords.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_scores_are_centered() {
        let x = CsrMatrix::from_dense(&array![
            [1.0, 0.0, 0.5],
            [0.0, 1.0, 0.5],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.3, 0.2, 0.1],
        ]);
        let p = Projector::new(PcaConfig::default()).project(&x).unwrap();
        assert_eq!(p.coords.dim(), (5, 2));
        for mean in p.coords.mean_axis(Axis(0)).unwrap().iter() {
            assert!(mean.abs() < 1e-9);
        }
        assert!(p.explained_variance[0] >= p.explained_variance[1]);
        let components_dot = p.components.row(0).dot(&p.components.row(1));
        assert!(components_dot.abs() < 1e-6);
    }

    #[test]
    fn test_sign_does_not_depend_on_seed() {
        let a = Projector::new(PcaConfig::default()).project(&cross()).unwrap();
        let b = Projector::new(PcaConfig {
            seed: 7,
            ..PcaConfig::default()
        })
        .project(&cross())
        .unwrap();
        for (x, y) in a.coords.iter().zip(b.coords.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_single_row_is_an_error() {
        let x = CsrMatrix::from_dense(&array![[1.0, 2.0]]);
        assert!(Projector::new(PcaConfig::default()).project(&x).is_err());
    }

    #[test]
    fn test_more_components_than_features_is_an_error() {
        let x = CsrMatrix::from_dense(&array![[1.0], [2.0]]);
        assert!(Projector::new(PcaConfig::default()).project(&x).is_err());
    }
}
