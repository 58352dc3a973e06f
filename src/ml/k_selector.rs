// ============================================================
// Layer 5 — KSelector
// ============================================================
// Picks the number of topics by silhouette score.
//
//   for k in k_range (default 2..13):
//       fit K-means (n_init restarts, fixed seed)
//       score the labels with silhouette on ≤ sample_size rows
//   best_k = first k whose score beats every earlier score
//
// The silhouette sample comes from its own RNG, seeded once per
// scan with `sample_seed`, so two scans over the same matrix
// always pick the same k.
//
// A k that is not below the number of documents cannot be
// scored and is skipped.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::kmeans::{KMeans, KMeansConfig};
use crate::ml::silhouette::silhouette_score;
use crate::ml::sparse::CsrMatrix;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KSelectorConfig {
    /// Candidate cluster counts, end exclusive
    pub k_range: Range<usize>,
    /// Restarts, iteration cap and seed used for every candidate fit
    pub kmeans: KMeansConfig,
    /// Silhouette is computed on at most this many rows
    pub sample_size: usize,
    pub sample_seed: u64,
}

impl Default for KSelectorConfig {
    fn default() -> Self {
        Self {
            k_range: 2..13,
            kmeans: KMeansConfig::default(),
            sample_size: 5000,
            sample_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KScore {
    pub k: usize,
    pub silhouette: f64,
}

/// Outcome of a k scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KSelection {
    pub best_k: usize,
    pub best_score: f64,
    /// Every candidate that could be scored, in scan order
    pub scores: Vec<KScore>,
}

pub struct KSelector {
    config: KSelectorConfig,
}

impl KSelector {
    pub fn new(config: KSelectorConfig) -> Self {
        Self { config }
    }

    pub fn select(&self, x: &CsrMatrix) -> AnalysisResult<KSelection> {
        let range = self.config.k_range.clone();
        if range.start < 2 || range.is_empty() {
            return Err(AnalysisError::invalid_config(format!(
                "candidate k range {}..{} must be non-empty and start at 2 or more",
                range.start, range.end
            )));
        }

        let mut sample_rng = StdRng::seed_from_u64(self.config.sample_seed);
        let mut scores = Vec::new();
        let mut best: Option<KScore> = None;

        for k in range {
            if k >= x.n_rows() {
                tracing::warn!(
                    "Skipping k={}: only {} documents to cluster",
                    k,
                    x.n_rows()
                );
                continue;
            }

            let kmeans = KMeans::new(self.config.kmeans.clone().with_clusters(k));
            let model = kmeans.fit(x)?;
            let silhouette = match silhouette_score(
                x,
                model.labels(),
                Some(self.config.sample_size),
                &mut sample_rng,
            ) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Skipping k={}: {}", k, e);
                    continue;
                }
            };

            tracing::info!("k={:>2}  silhouette={:.4}", k, silhouette);
            let score = KScore { k, silhouette };
            scores.push(score);

            if best.map_or(true, |b| silhouette > b.silhouette) {
                best = Some(score);
            }
        }

        let best = best.ok_or_else(|| {
            AnalysisError::insufficient(format!(
                "no candidate k could be scored on {} documents",
                x.n_rows()
            ))
        })?;

        tracing::info!(
            "Best k={} (silhouette={:.4})",
            best.k,
            best.silhouette
        );
        Ok(KSelection {
            best_k: best.k,
            best_score: best.silhouette,
            scores,
        })
    }
}
