//! Silhouette score over sparse rows (Euclidean distance).
//!
//! For a row `i` in cluster `A`:
//!   a(i) = mean distance to the other rows of `A`
//!   b(i) = smallest mean distance to the rows of any other cluster
//!   s(i) = (b − a) / max(a, b), and 0 when `A` has a single row
//! The score is the mean of s(i), in [-1, 1].
//!
//! Large corpora are scored on a random subset of `sample_size` rows,
//! drawn with the caller's RNG.

use rand::rngs::StdRng;
use rand::seq::index;
use std::collections::BTreeSet;

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::sparse::CsrMatrix;

/// Silhouette score, optionally on a sample of at most `sample_size` rows.
pub fn silhouette_score(
    x: &CsrMatrix,
    labels: &[usize],
    sample_size: Option<usize>,
    rng: &mut StdRng,
) -> AnalysisResult<f64> {
    let n = x.n_rows();
    if labels.len() != n {
        return Err(AnalysisError::invalid_config(format!(
            "{} labels for {} rows",
            labels.len(),
            n
        )));
    }

    match sample_size {
        Some(size) if size < n => {
            let mut rows = index::sample(rng, n, size).into_vec();
            rows.sort_unstable();
            let sub_labels: Vec<usize> = rows.iter().map(|&r| labels[r]).collect();
            full_silhouette(&x.select_rows(&rows), &sub_labels)
        }
        _ => full_silhouette(x, labels),
    }
}

fn full_silhouette(x: &CsrMatrix, labels: &[usize]) -> AnalysisResult<f64> {
    let n = x.n_rows();
    let distinct: BTreeSet<usize> = labels.iter().copied().collect();
    if distinct.len() < 2 || distinct.len() > n.saturating_sub(1) {
        return Err(AnalysisError::insufficient(format!(
            "silhouette needs 2..={} distinct labels, got {}",
            n.saturating_sub(1),
            distinct.len()
        )));
    }

    // compact label ids so per-row sums fit in a dense n × k table
    let ids: Vec<usize> = distinct.iter().copied().collect();
    let compact: Vec<usize> = labels
        .iter()
        .map(|l| ids.binary_search(l).unwrap_or(0))
        .collect();
    let k = ids.len();

    let mut sizes = vec![0usize; k];
    for &c in &compact {
        sizes[c] += 1;
    }

    let sq_norms = x.row_sq_norms();
    let mut dist_sums = vec![0.0f64; n * k];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (sq_norms[i] + sq_norms[j] - 2.0 * x.rows_dot(i, j)).max(0.0).sqrt();
            dist_sums[i * k + compact[j]] += d;
            dist_sums[j * k + compact[i]] += d;
        }
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = compact[i];
        if sizes[own] < 2 {
            continue;
        }
        let a = dist_sums[i * k + own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| dist_sums[i * k + c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / n as f64)
}
