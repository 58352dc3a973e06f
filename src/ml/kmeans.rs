// ============================================================
// Layer 5 — K-means
// ============================================================
// Lloyd's algorithm over sparse rows with dense centroids.
//
//   for each of `n_init` runs (one seeded RNG shared by all runs):
//     1. k-means++ seeding: first centroid uniform, each next one
//        drawn with probability ∝ squared distance to the nearest
//        centroid chosen so far
//     2. repeat until the total squared centroid shift drops to
//        tol × (mean column variance), or max_iter is reached:
//          assign every row to its nearest centroid
//          move every centroid to the mean of its rows
//        a cluster left empty takes over the row farthest from
//        its current centroid
//     3. final assignment + inertia (sum of squared distances)
//   keep the run with the lowest inertia (earliest run on ties)
//
// Distances use ‖x‖² − 2·x·c + ‖c‖², so each row costs only its
// non-zeros per centroid.
//
// Reference: Arthur & Vassilvitskii (2007) k-means++

use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::sparse::CsrMatrix;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    /// Independent k-means++ restarts; the lowest inertia wins
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold, relative to the mean column variance
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

impl KMeansConfig {
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }
}

/// A fitted clustering.
#[derive(Debug, Clone)]
pub struct KMeansModel {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
}

impl KMeansModel {
    /// One centroid per row, in feature space.
    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Cluster label of every training row, in [0, k).
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }
}

fn centroid_sq_norms(centroids: &Array2<f64>) -> Vec<f64> {
    centroids.rows().into_iter().map(|c| c.dot(&c)).collect()
}

fn sq_dist(x: &CsrMatrix, i: usize, x_sq_norm: f64, c: ArrayView1<'_, f64>, c_sq_norm: f64) -> f64 {
    (x_sq_norm - 2.0 * x.row_dot(i, c) + c_sq_norm).max(0.0)
}

/// (label, squared distance) of the closest centroid; lowest label on ties.
fn nearest(
    x: &CsrMatrix,
    i: usize,
    x_sq_norm: f64,
    centroids: &Array2<f64>,
    c_norms: &[f64],
) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = sq_dist(x, i, x_sq_norm, centroid, c_norms[c]);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn set_centroid_to_row(centroids: &mut Array2<f64>, c: usize, x: &CsrMatrix, i: usize) {
    let mut row = centroids.row_mut(c);
    row.fill(0.0);
    x.add_row_to(i, 1.0, &mut row);
}

pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, x: &CsrMatrix) -> AnalysisResult<KMeansModel> {
        let k = self.config.n_clusters;
        let n = x.n_rows();
        if k == 0 || self.config.n_init == 0 || self.config.max_iter == 0 {
            return Err(AnalysisError::invalid_config(format!(
                "k-means needs k, n_init and max_iter >= 1 (got {k}, {}, {})",
                self.config.n_init, self.config.max_iter
            )));
        }
        if n < k {
            return Err(AnalysisError::insufficient(format!(
                "{n} rows cannot form {k} clusters"
            )));
        }

        let tol = self.config.tol * x.mean_column_variance();
        let sq_norms = x.row_sq_norms();
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut best: Option<KMeansModel> = None;
        for run in 0..self.config.n_init {
            let seeds = self.init_plus_plus(x, &sq_norms, &mut rng);
            let model = self.lloyd(x, &sq_norms, seeds, tol);
            tracing::debug!(
                "k-means k={} run {}: inertia={:.6} after {} iterations",
                k,
                run,
                model.inertia,
                model.n_iter
            );
            if best.as_ref().map_or(true, |b| model.inertia < b.inertia) {
                best = Some(model);
            }
        }

        best.ok_or(AnalysisError::NotFitted("KMeans"))
    }

    fn init_plus_plus(&self, x: &CsrMatrix, sq_norms: &[f64], rng: &mut StdRng) -> Array2<f64> {
        let (n, k) = (x.n_rows(), self.config.n_clusters);
        let mut centroids = Array2::<f64>::zeros((k, x.n_cols()));

        let first = rng.gen_range(0..n);
        set_centroid_to_row(&mut centroids, 0, x, first);
        let c0_norm = sq_norms[first];
        let mut closest: Vec<f64> = (0..n)
            .map(|i| sq_dist(x, i, sq_norms[i], centroids.row(0), c0_norm))
            .collect();

        for c in 1..k {
            let total: f64 = closest.iter().sum();
            let pick = if total > 0.0 {
                let target = rng.gen::<f64>() * total;
                let mut acc = 0.0;
                closest
                    .iter()
                    .position(|&d| {
                        acc += d;
                        acc >= target && d > 0.0
                    })
                    .unwrap_or(n - 1)
            } else {
                rng.gen_range(0..n)
            };

            set_centroid_to_row(&mut centroids, c, x, pick);
            let c_norm = sq_norms[pick];
            for (i, slot) in closest.iter_mut().enumerate() {
                let d = sq_dist(x, i, sq_norms[i], centroids.row(c), c_norm);
                if d < *slot {
                    *slot = d;
                }
            }
        }
        centroids
    }

    fn assign(
        x: &CsrMatrix,
        sq_norms: &[f64],
        centroids: &Array2<f64>,
        labels: &mut [usize],
        dists: &mut [f64],
    ) {
        let c_norms = centroid_sq_norms(centroids);
        for i in 0..x.n_rows() {
            let (label, d) = nearest(x, i, sq_norms[i], centroids, &c_norms);
            labels[i] = label;
            dists[i] = d;
        }
    }

    fn lloyd(&self, x: &CsrMatrix, sq_norms: &[f64], mut centroids: Array2<f64>, tol: f64) -> KMeansModel {
        let (n, k) = (x.n_rows(), self.config.n_clusters);
        let mut labels = vec![0usize; n];
        let mut dists = vec![0.0f64; n];
        let mut n_iter = 0;

        for iter in 1..=self.config.max_iter {
            n_iter = iter;
            Self::assign(x, sq_norms, &centroids, &mut labels, &mut dists);

            let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
            let mut counts = vec![0usize; k];
            for (i, &label) in labels.iter().enumerate() {
                x.add_row_to(i, 1.0, &mut sums.row_mut(label));
                counts[label] += 1;
            }

            // Refill empty clusters from the rows farthest from their centroid
            let empty: Vec<usize> = (0..k).filter(|&c| counts[c] == 0).collect();
            if !empty.is_empty() {
                let mut far: Vec<usize> = (0..n).collect();
                far.sort_by(|&a, &b| dists[b].total_cmp(&dists[a]).then(a.cmp(&b)));
                for (&c, &row) in empty.iter().zip(&far) {
                    set_centroid_to_row(&mut sums, c, x, row);
                    counts[c] = 1;
                }
            }

            for (mut row, &count) in sums.axis_iter_mut(Axis(0)).zip(&counts) {
                row /= count as f64;
            }

            let shift: f64 = (&sums - &centroids).mapv(|v| v * v).sum();
            centroids = sums;
            if shift <= tol {
                break;
            }
        }

        Self::assign(x, sq_norms, &centroids, &mut labels, &mut dists);
        KMeansModel {
            centroids,
            labels,
            inertia: dists.iter().sum(),
            n_iter,
        }
    }
}

/// Per-cluster row counts.
pub fn cluster_sizes(labels: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; k];
    for &label in labels {
        if label < k {
            sizes[label] += 1;
        }
    }
    sizes
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Three tight blobs of two points each.
    fn blobs() -> CsrMatrix {
        CsrMatrix::from_dense(&array![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.1, 0.9, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.1, 0.9],
        ])
    }

    fn config(k: usize) -> KMeansConfig {
        KMeansConfig::default().with_clusters(k)
    }

    #[test]
    fn test_recovers_obvious_blobs() {
        let model = KMeans::new(config(3)).fit(&blobs()).unwrap();
        let l = model.labels();

        assert_eq!(l.len(), 6);
        assert_eq!(l[0], l[1]);
        assert_eq!(l[2], l[3]);
        assert_eq!(l[4], l[5]);
        assert_ne!(l[0], l[2]);
        assert_ne!(l[2], l[4]);
        assert_ne!(l[0], l[4]);
        assert!(model.inertia() < 0.1);
    }

    #[test]
    fn test_labels_in_range() {
        for k in 1..=6 {
            let model = KMeans::new(config(k)).fit(&blobs()).unwrap();
            assert_eq!(model.n_clusters(), k);
            assert!(model.labels().iter().all(|&l| l < k));
            // every cluster is used when n >= k
            assert!(cluster_sizes(model.labels(), k).iter().all(|&s| s > 0));
        }
    }

    #[test]
    fn test_same_seed_same_labels() {
        let a = KMeans::new(config(3)).fit(&blobs()).unwrap();
        let b = KMeans::new(config(3)).fit(&blobs()).unwrap();
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.centroids(), b.centroids());
    }

    #[test]
    fn test_too_few_rows_is_an_error() {
        assert!(matches!(
            KMeans::new(config(7)).fit(&blobs()),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_centroid_is_cluster_mean() {
        let model = KMeans::new(config(3)).fit(&blobs()).unwrap();
        let c = model.centroids().row(model.labels()[0]);
        assert!((c[0] - 0.95).abs() < 1e-9);
        assert!((c[1] - 0.05).abs() < 1e-9);
    }
}
