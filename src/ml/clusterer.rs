// ============================================================
// Layer 5 — Clusterer
// ============================================================
// Final K-means fit at the chosen k, plus the report of what
// each cluster is "about": the vocabulary terms with the largest
// weight in its centroid.
//
// Centroids are only used for this report and dropped afterwards;
// what survives is the per-document label array.

use serde::{Deserialize, Serialize};

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::kmeans::{cluster_sizes, KMeans, KMeansConfig};
use crate::ml::sparse::CsrMatrix;

/// Top terms of one cluster, heaviest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTerms {
    pub cluster: usize,
    pub size: usize,
    pub terms: Vec<String>,
    /// Centroid weight of each term, non-increasing
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    /// One label in [0, k) per document
    pub labels: Vec<usize>,
    pub clusters: Vec<ClusterTerms>,
    pub inertia: f64,
}

pub struct Clusterer {
    kmeans: KMeansConfig,
    top_n: usize,
}

impl Clusterer {
    pub fn new(kmeans: KMeansConfig, top_n: usize) -> Self {
        Self { kmeans, top_n }
    }

    pub fn fit(&self, x: &CsrMatrix, vocabulary: &[String], k: usize) -> AnalysisResult<ClusterResult> {
        if vocabulary.len() != x.n_cols() {
            return Err(AnalysisError::invalid_config(format!(
                "vocabulary has {} terms but the matrix has {} columns",
                vocabulary.len(),
                x.n_cols()
            )));
        }

        let model = KMeans::new(self.kmeans.clone().with_clusters(k)).fit(x)?;
        let sizes = cluster_sizes(model.labels(), k);

        let clusters = model
            .centroids()
            .rows()
            .into_iter()
            .enumerate()
            .map(|(cluster, centroid)| {
                let mut order: Vec<usize> = (0..centroid.len()).collect();
                // heaviest first; vocabulary order among equal weights
                order.sort_by(|&a, &b| centroid[b].total_cmp(&centroid[a]).then(a.cmp(&b)));
                order.truncate(self.top_n);
                ClusterTerms {
                    cluster,
                    size: sizes[cluster],
                    terms: order.iter().map(|&col| vocabulary[col].clone()).collect(),
                    weights: order.iter().map(|&col| centroid[col]).collect(),
                }
            })
            .collect();

        tracing::info!(
            "Clustered {} documents into {} clusters (inertia={:.4})",
            x.n_rows(),
            k,
            model.inertia()
        );

        let inertia = model.inertia();
        Ok(ClusterResult {
            labels: model.into_labels(),
            clusters,
            inertia,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::k_selector::tests::four_topic_corpus;
    use crate::ml::tfidf::{TfidfConfig, TfidfVectorizer};

    fn fitted() -> (CsrMatrix, Vec<String>) {
        let mut v = TfidfVectorizer::new(TfidfConfig {
            ngram_range: (1, 1),
            min_df: 1,
            max_df: 1.0,
            ..TfidfConfig::default()
        });
        let m = v.fit_transform(&four_topic_corpus()).unwrap();
        (m, v.vocabulary().to_vec())
    }

    #[test]
    fn test_labels_cover_every_document_in_range() {
        let (m, vocab) = fitted();
        let result = Clusterer::new(KMeansConfig::default(), 10).fit(&m, &vocab, 4).unwrap();
        assert_eq!(result.labels.len(), 20);
        assert!(result.labels.iter().all(|&l| l < 4));
        assert_eq!(result.clusters.len(), 4);
        assert_eq!(result.clusters.iter().map(|c| c.size).sum::<usize>(), 20);
    }

    #[test]
    fn test_top_terms_belong_to_one_topic() {
        let (m, vocab) = fitted();
        let result = Clusterer::new(KMeansConfig::default(), 3).fit(&m, &vocab, 4).unwrap();
        let hospital = ["hospital", "nurse", "waiting", "patient", "surgery"];

        let cluster = result
            .clusters
            .iter()
            .find(|c| c.terms.iter().any(|t| t == "nurse"))
            .unwrap();
        assert_eq!(cluster.terms.len(), 3);
        assert!(cluster.terms.iter().all(|t| hospital.contains(&t.as_str())));
    }

    #[test]
    fn test_top_terms_are_heaviest_first() {
        let (m, vocab) = fitted();
        let result = Clusterer::new(KMeansConfig::default(), 10).fit(&m, &vocab, 4).unwrap();
        for cluster in &result.clusters {
            assert_eq!(cluster.terms.len(), 10);
            assert_eq!(cluster.weights.len(), 10);
            assert!(cluster.weights.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_equal_weights_follow_vocabulary_order() {
        let vocab: Vec<String> = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let w = 1.0 / 3f64.sqrt();
        let odd = vec![(5, w), (1, w), (3, w)];
        let even = vec![(4, w), (0, w), (2, w)];
        let rows = vec![odd.clone(), even.clone(), odd.clone(), even.clone(), odd, even];
        let m = CsrMatrix::from_rows(6, rows);

        let result = Clusterer::new(KMeansConfig::default(), 4).fit(&m, &vocab, 2).unwrap();
        let odd_cluster = &result.clusters[result.labels[0]];
        let even_cluster = &result.clusters[result.labels[1]];
        // three equal weights, then zero weights, each group in vocabulary order
        assert_eq!(odd_cluster.terms, ["bravo", "delta", "foxtrot", "alpha"]);
        assert_eq!(even_cluster.terms, ["alpha", "charlie", "echo", "bravo"]);
    }

    #[test]
    fn test_equal_bigram_weights_follow_vocabulary_order() {
        let railway = "railway station signal timetable train";
        let fishing = "fishing quota fleet harbour";
        let docs = [railway, fishing, railway, fishing, railway, fishing];
        let mut v = TfidfVectorizer::new(TfidfConfig::default());
        let m = v.fit_transform(&docs).unwrap();

        let clusterer = Clusterer::new(KMeansConfig::default(), 5);
        for _ in 0..10 {
            let result = clusterer.fit(&m, v.vocabulary(), 2).unwrap();
            let cluster = &result.clusters[result.labels[0]];
            assert_eq!(
                cluster.terms,
                ["railway", "railway station", "signal", "signal timetable", "station"]
            );
        }
    }

    #[test]
    fn test_refit_is_deterministic() {
        let (m, vocab) = fitted();
        let c = Clusterer::new(KMeansConfig::default(), 10);
        assert_eq!(c.fit(&m, &vocab, 4).unwrap(), c.fit(&m, &vocab, 4).unwrap());
    }

    #[test]
    fn test_vocabulary_mismatch_is_an_error() {
        let (m, vocab) = fitted();
        let short = &vocab[..3];
        assert!(Clusterer::new(KMeansConfig::default(), 10).fit(&m, short, 4).is_err());
    }
}
