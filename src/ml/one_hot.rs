// ============================================================
// Layer 5 — ColumnTransform
// ============================================================
// Turns EncodedPositions into a dense feature matrix:
//
//   [ one-hot(white_king_file) | one-hot(white_rook_file) |
//     one-hot(black_king_file) | wk_rank  wr_rank  bk_rank ]
//
// Categories are learned per file column at fit time, in sorted
// order. A file value never seen during fit encodes as all zeros
// in its block rather than failing. Ranks pass through as-is.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::endgame::{EncodedPosition, FILE_COLUMNS, RANK_COLUMNS};
use crate::domain::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnTransform {
    /// Sorted categories of each file column; empty until fitted
    categories: Vec<Vec<u8>>,
}

impl ColumnTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.categories.is_empty()
    }

    pub fn fit(&mut self, samples: &[EncodedPosition]) -> AnalysisResult<()> {
        if samples.is_empty() {
            return Err(AnalysisError::EmptyInput(
                "column transform fitted on zero samples".into(),
            ));
        }
        self.categories = (0..FILE_COLUMNS.len())
            .map(|col| {
                let mut seen: Vec<u8> = samples.iter().map(|s| s.files[col]).collect();
                seen.sort_unstable();
                seen.dedup();
                seen
            })
            .collect();
        tracing::debug!(
            "Column transform: {} one-hot + {} passthrough features",
            self.n_one_hot(),
            RANK_COLUMNS.len()
        );
        Ok(())
    }

    fn n_one_hot(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn n_features(&self) -> usize {
        self.n_one_hot() + RANK_COLUMNS.len()
    }

    pub fn transform(&self, samples: &[EncodedPosition]) -> AnalysisResult<Array2<f64>> {
        if !self.is_fitted() {
            return Err(AnalysisError::NotFitted("ColumnTransform"));
        }
        let n_one_hot = self.n_one_hot();
        let mut out = Array2::<f64>::zeros((samples.len(), self.n_features()));

        for (i, sample) in samples.iter().enumerate() {
            let mut offset = 0;
            for (col, cats) in self.categories.iter().enumerate() {
                if let Ok(pos) = cats.binary_search(&sample.files[col]) {
                    out[[i, offset + pos]] = 1.0;
                }
                offset += cats.len();
            }
            for (j, &rank) in sample.ranks.iter().enumerate() {
                out[[i, n_one_hot + j]] = f64::from(rank);
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, samples: &[EncodedPosition]) -> AnalysisResult<Array2<f64>> {
        self.fit(samples)?;
        self.transform(samples)
    }

    /// Output column names, e.g. `white_king_file_3`, `black_king_rank`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .categories
            .iter()
            .zip(FILE_COLUMNS)
            .flat_map(|(cats, column)| cats.iter().map(move |c| format!("{column}_{c}")))
            .collect();
        names.extend(RANK_COLUMNS.iter().map(|c| c.to_string()));
        names
    }
}
