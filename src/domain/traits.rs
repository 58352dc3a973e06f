// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits rather
// than concrete loaders and models:
//
//   RecordSource<T> — anything that yields a table of records
//   Classifier<S>   — anything that can be fitted on samples
//                     and labels, then predict labels; this is
//                     what cross-validation needs to re-fit a
//                     fresh model on every fold
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::error::AnalysisResult;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can load a table of records.
///
/// Implementations:
///   - DebateCsvLoader  → rows of debates_2022.csv
///   - EndgameCsvLoader → rows of king_rook_vs_king.csv
pub trait RecordSource<T> {
    /// Load every usable record. Incomplete rows are dropped,
    /// structural problems (missing columns) are errors.
    fn load_all(&self) -> Result<Vec<T>>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A supervised model over samples of type `S` with integer class labels.
pub trait Classifier<S> {
    /// Fit on `samples` with one label per sample.
    fn fit(&mut self, samples: &[S], labels: &[usize]) -> AnalysisResult<()>;

    /// Predict one label per sample. Fails if called before `fit`.
    fn predict(&self, samples: &[S]) -> AnalysisResult<Vec<usize>>;
}
