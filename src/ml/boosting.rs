// ============================================================
// Layer 5 — Gradient Boosting Classifier
// ============================================================
// Multinomial-deviance gradient boosting with regression trees.
//
//   F_k(x) ← log prior of class k
//   for stage in 0..n_estimators:
//       p = softmax(F)                      (once per stage)
//       rows = all rows, or a seeded subsample
//       for each class k:
//           r_i  = 1[y_i = k] − p_ik        (negative gradient)
//           tree = RegressionTree fitted to r on `rows`
//           leaf ← (K−1)/K · Σr / Σ p(1−p)  (one Newton step)
//           F_k += learning_rate · tree(x)
//
// Every stage grows one tree per class, two classes included.
// Class labels may be any usize; they are mapped to dense class
// indices in sorted order at fit time.
//
// Reference: Friedman (2001) "Greedy Function Approximation"

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::tree::{BinnedFeatures, RegressionTree, TreeConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows drawn (without replacement) for every stage
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    fn validate(&self) -> AnalysisResult<()> {
        if self.n_estimators == 0 {
            return Err(AnalysisError::invalid_config("n_estimators must be >= 1"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(AnalysisError::invalid_config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(AnalysisError::invalid_config(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

pub struct GradientBoostingClassifier {
    config: BoostingConfig,
    /// Sorted distinct training labels; index = class column
    classes: Vec<usize>,
    init: Array1<f64>,
    /// stages[s][k] is the tree for class k at stage s
    stages: Vec<Vec<RegressionTree>>,
}

impl GradientBoostingClassifier {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            init: Array1::zeros(0),
            stages: Vec::new(),
        }
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn fit(&mut self, x: &Array2<f64>, labels: &[usize]) -> AnalysisResult<()> {
        self.config.validate()?;
        let n = x.nrows();
        if labels.len() != n {
            return Err(AnalysisError::invalid_config(format!(
                "{} labels for {} rows",
                labels.len(),
                n
            )));
        }

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(AnalysisError::insufficient(format!(
                "gradient boosting needs at least 2 classes, got {}",
                classes.len()
            )));
        }
        let k = classes.len();
        let y: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or(0))
            .collect();

        // ── Step 1: log-prior initial scores ──
        let mut counts = vec![0usize; k];
        for &c in &y {
            counts[c] += 1;
        }
        let init = Array1::from_iter(counts.iter().map(|&c| (c as f64 / n as f64).ln()));
        let mut raw = Array2::<f64>::zeros((n, k));
        raw += &init;

        let binned = BinnedFeatures::new(x);
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            ..TreeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let n_inbag = ((self.config.subsample * n as f64) as usize).clamp(1, n);
        let scale = (k - 1) as f64 / k as f64;

        let mut stages = Vec::with_capacity(self.config.n_estimators);
        for stage in 0..self.config.n_estimators {
            // ── Step 2: class probabilities at the start of the stage ──
            let proba = softmax(&raw);
            let rows: Vec<usize> = if n_inbag < n {
                let mut r = index::sample(&mut rng, n, n_inbag).into_vec();
                r.sort_unstable();
                r
            } else {
                (0..n).collect()
            };

            // ── Step 3: one Newton-updated tree per class ──
            let mut trees = Vec::with_capacity(k);
            for class in 0..k {
                let residual: Vec<f64> = (0..n)
                    .map(|i| f64::from(u8::from(y[i] == class)) - proba[[i, class]])
                    .collect();
                let mut tree = RegressionTree::fit(&tree_config, &binned, &residual, &rows)?;

                let mut num = vec![0.0f64; tree.n_nodes()];
                let mut den = vec![0.0f64; tree.n_nodes()];
                let mut reached = vec![false; tree.n_nodes()];
                for &i in &rows {
                    let leaf = tree.apply(x.row(i));
                    let p = proba[[i, class]];
                    num[leaf] += residual[i];
                    den[leaf] += p * (1.0 - p);
                    reached[leaf] = true;
                }
                for leaf in (0..tree.n_nodes()).filter(|&l| reached[l]) {
                    let value = if den[leaf].abs() < 1e-150 {
                        0.0
                    } else {
                        scale * num[leaf] / den[leaf]
                    };
                    tree.set_leaf_value(leaf, value);
                }

                raw.column_mut(class)
                    .scaled_add(self.config.learning_rate, &tree.predict(x));
                trees.push(tree);
            }
            stages.push(trees);

            if stage % 10 == 0 || stage + 1 == self.config.n_estimators {
                tracing::debug!(
                    "Boosting stage {:>3}: train deviance={:.6}",
                    stage + 1,
                    deviance(&softmax(&raw), &y)
                );
            }
        }

        tracing::info!(
            "Gradient boosting fitted: {} stages × {} classes on {} rows",
            stages.len(),
            k,
            n
        );
        self.classes = classes;
        self.init = init;
        self.stages = stages;
        Ok(())
    }

    /// Raw additive scores F, one column per class.
    pub fn decision_function(&self, x: &Array2<f64>) -> AnalysisResult<Array2<f64>> {
        if self.stages.is_empty() {
            return Err(AnalysisError::NotFitted("GradientBoostingClassifier"));
        }
        let k = self.classes.len();
        let mut raw = Array2::<f64>::zeros((x.nrows(), k));
        raw += &self.init;
        for trees in &self.stages {
            for (class, tree) in trees.iter().enumerate() {
                let update = tree.predict(x) * self.config.learning_rate;
                let mut column = raw.column_mut(class);
                column += &update;
            }
        }
        Ok(raw)
    }

    /// Class probabilities, columns in `classes()` order.
    pub fn predict_proba(&self, x: &Array2<f64>) -> AnalysisResult<Array2<f64>> {
        Ok(softmax(&self.decision_function(x)?))
    }

    /// Most probable class per row; the lowest class wins exact ties.
    pub fn predict(&self, x: &Array2<f64>) -> AnalysisResult<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0usize, f64::NEG_INFINITY), |acc, (c, &v)| {
                        if v > acc.1 {
                            (c, v)
                        } else {
                            acc
                        }
                    })
                    .0;
                self.classes[best]
            })
            .collect())
    }
}

/// Row-wise softmax, shifted by the row maximum.
fn softmax(raw: &Array2<f64>) -> Array2<f64> {
    let mut out = raw.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    out
}

/// Mean multinomial deviance (negative log-likelihood).
fn deviance(proba: &Array2<f64>, y: &[usize]) -> f64 {
    let total: f64 = y
        .iter()
        .enumerate()
        .map(|(i, &c)| -proba[[i, c]].max(1e-300).ln())
        .sum();
    total / y.len() as f64
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Three classes decided by which of two thresholds x[0] crosses.
    fn bands() -> (Array2<f64>, Vec<usize>) {
        let n = 30;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let labels = (0..n).map(|i| i / 10 * 2).collect();
        (x, labels)
    }

    #[test]
    fn test_fits_separable_bands() {
        let (x, labels) = bands();
        let mut gb = GradientBoostingClassifier::new(BoostingConfig::default());
        gb.fit(&x, &labels).unwrap();

        assert_eq!(gb.classes(), &[0, 2, 4]);
        assert_eq!(gb.n_stages(), 100);
        assert_eq!(gb.predict(&x).unwrap(), labels);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, labels) = bands();
        let mut gb = GradientBoostingClassifier::new(BoostingConfig {
            n_estimators: 10,
            ..BoostingConfig::default()
        });
        gb.fit(&x, &labels).unwrap();
        let proba = gb.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_two_classes_grow_one_tree_each() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let mut gb = GradientBoostingClassifier::new(BoostingConfig {
            n_estimators: 5,
            ..BoostingConfig::default()
        });
        gb.fit(&x, &[0, 0, 1, 1]).unwrap();
        assert_eq!(gb.predict(&x).unwrap(), vec![0, 0, 1, 1]);
        assert!(gb.stages.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn test_subsampled_fit_is_deterministic() {
        let (x, labels) = bands();
        let config = BoostingConfig {
            n_estimators: 20,
            subsample: 0.5,
            ..BoostingConfig::default()
        };
        let mut a = GradientBoostingClassifier::new(config.clone());
        let mut b = GradientBoostingClassifier::new(config);
        a.fit(&x, &labels).unwrap();
        b.fit(&x, &labels).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_single_class_is_an_error() {
        let x = array![[0.0], [1.0]];
        let mut gb = GradientBoostingClassifier::new(BoostingConfig::default());
        assert!(matches!(gb.fit(&x, &[3, 3]), Err(AnalysisError::InsufficientData(_))));
    }

    #[test]
    fn test_predict_before_fit_is_an_error() {
        let gb = GradientBoostingClassifier::new(BoostingConfig::default());
        assert!(gb.predict(&array![[0.0]]).is_err());
    }

    #[test]
    fn test_invalid_subsample_is_rejected() {
        let (x, labels) = bands();
        let mut gb = GradientBoostingClassifier::new(BoostingConfig {
            subsample: 0.0,
            ..BoostingConfig::default()
        });
        assert!(matches!(gb.fit(&x, &labels), Err(AnalysisError::InvalidConfig(_))));
    }
}
