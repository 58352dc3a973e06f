// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Scoring for the endgame classifier:
//
//   cross_val_accuracy   — fresh model per stratified fold
//   ConfusionMatrix      — counts[true][predicted]
//   ClassificationReport — per-class precision / recall / F1 /
//                          support plus accuracy, macro average
//                          and support-weighted average
//
// Label sets for the matrix and report are the sorted union of
// true and predicted labels. Any ratio with a zero denominator
// is reported as 0.0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::data::splitter::stratified_k_fold;
use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::domain::traits::Classifier;

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn check_lengths(y_true: &[usize], y_pred: &[usize]) -> AnalysisResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(AnalysisError::invalid_config(format!(
            "{} true labels vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(AnalysisError::EmptyInput("no predictions to score".into()));
    }
    Ok(())
}

pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> AnalysisResult<f64> {
    check_lengths(y_true, y_pred)?;
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(hits as f64 / y_true.len() as f64)
}

/// Share of the most frequent label; what always guessing it would score.
pub fn majority_baseline(labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let mut sorted = labels.to_vec();
    sorted.sort_unstable();
    let most = sorted
        .chunk_by(|a, b| a == b)
        .map(<[usize]>::len)
        .max()
        .unwrap_or(0);
    most as f64 / labels.len() as f64
}

// ─── Cross-validation ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvScores {
    /// Accuracy of each fold, in fold order
    pub scores: Vec<f64>,
}

impl CvScores {
    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    /// Population standard deviation across folds.
    pub fn std(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self.scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / self.scores.len() as f64;
        var.sqrt()
    }
}

/// Accuracy of a freshly built classifier on each of `folds`
/// stratified folds.
pub fn cross_val_accuracy<S, C, F>(
    make_classifier: F,
    samples: &[S],
    labels: &[usize],
    folds: usize,
) -> AnalysisResult<CvScores>
where
    S: Clone,
    C: Classifier<S>,
    F: Fn() -> C,
{
    if samples.len() != labels.len() {
        return Err(AnalysisError::invalid_config(format!(
            "{} samples vs {} labels",
            samples.len(),
            labels.len()
        )));
    }

    let splits = stratified_k_fold(labels, folds)?;
    let mut scores = Vec::with_capacity(splits.len());
    for (fold, split) in splits.iter().enumerate() {
        let train_x: Vec<S> = split.train.iter().map(|&i| samples[i].clone()).collect();
        let train_y: Vec<usize> = split.train.iter().map(|&i| labels[i]).collect();
        let test_x: Vec<S> = split.test.iter().map(|&i| samples[i].clone()).collect();
        let test_y: Vec<usize> = split.test.iter().map(|&i| labels[i]).collect();

        let mut model = make_classifier();
        model.fit(&train_x, &train_y)?;
        let score = accuracy(&test_y, &model.predict(&test_x)?)?;
        tracing::info!(
            "Fold {}/{}: accuracy={:.4} ({} train / {} test)",
            fold + 1,
            splits.len(),
            score,
            train_y.len(),
            test_y.len()
        );
        scores.push(score);
    }
    Ok(CvScores { scores })
}

// ─── Confusion matrix ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<usize>,
    /// counts[i][j] = rows with true label labels[i] predicted as labels[j]
    pub counts: Vec<Vec<usize>>,
}

fn label_union(y_true: &[usize], y_pred: &[usize]) -> Vec<usize> {
    y_true
        .iter()
        .chain(y_pred)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl ConfusionMatrix {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> AnalysisResult<Self> {
        check_lengths(y_true, y_pred)?;
        let labels = label_union(y_true, y_pred);
        let pos = |l: &usize| labels.binary_search(l).unwrap_or(0);

        let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
        for (t, p) in y_true.iter().zip(y_pred) {
            counts[pos(t)][pos(p)] += 1;
        }
        Ok(Self { labels, counts })
    }

    pub fn dim(&self) -> usize {
        self.labels.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Fixed-width text table, rows = true label, columns = predicted.
    pub fn render(&self, name: impl Fn(usize) -> String) -> String {
        let names: Vec<String> = self.labels.iter().map(|&l| name(l)).collect();
        let width = names
            .iter()
            .map(String::len)
            .chain(self.counts.iter().flatten().map(|c| c.to_string().len()))
            .max()
            .unwrap_or(1)
            .max(4);

        let mut out = String::new();
        let _ = write!(out, "{:>width$}", "");
        for n in &names {
            let _ = write!(out, " {n:>width$}");
        }
        out.push('\n');
        for (n, row) in names.iter().zip(&self.counts) {
            let _ = write!(out, "{n:>width$}");
            for c in row {
                let _ = write!(out, " {c:>width$}");
            }
            out.push('\n');
        }
        out
    }
}

// ─── Classification report ────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub labels: Vec<usize>,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> AnalysisResult<Self> {
        let cm = ConfusionMatrix::compute(y_true, y_pred)?;
        let k = cm.dim();
        let total = cm.total();

        let per_class: Vec<ClassMetrics> = (0..k)
            .map(|c| {
                let tp = cm.counts[c][c] as f64;
                let support: usize = cm.counts[c].iter().sum();
                let predicted: usize = cm.counts.iter().map(|row| row[c]).sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                ClassMetrics {
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let correct: usize = (0..k).map(|c| cm.counts[c][c]).sum();
        let average = |weight: &dyn Fn(&ClassMetrics) -> f64| {
            let w_sum: f64 = per_class.iter().map(weight).sum();
            let avg = |field: fn(&ClassMetrics) -> f64| {
                ratio(per_class.iter().map(|m| weight(m) * field(m)).sum(), w_sum)
            };
            ClassMetrics {
                precision: avg(|m| m.precision),
                recall: avg(|m| m.recall),
                f1: avg(|m| m.f1),
                support: total,
            }
        };

        Ok(Self {
            macro_avg: average(&|_: &ClassMetrics| 1.0),
            weighted_avg: average(&|m: &ClassMetrics| m.support as f64),
            accuracy: ratio(correct as f64, total as f64),
            labels: cm.labels,
            per_class,
        })
    }

    /// Text table in the familiar precision/recall/f1/support layout.
    pub fn render(&self, name: impl Fn(usize) -> String) -> String {
        let names: Vec<String> = self.labels.iter().map(|&l| name(l)).collect();
        let width = names.iter().map(String::len).max().unwrap_or(0).max("weighted avg".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        );
        out.push('\n');
        for (n, m) in names.iter().zip(&self.per_class) {
            let _ = writeln!(
                out,
                "{n:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            );
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        );
        for (label, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            let _ = writeln!(
                out,
                "{label:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            );
        }
        out
    }
}
