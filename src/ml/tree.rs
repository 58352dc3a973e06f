// ============================================================
// Layer 5 — Regression Tree
// ============================================================
// CART regression tree used as the weak learner of gradient
// boosting.
//
// Split search is exact but bin-based: every feature is reduced
// once to its sorted distinct training values (`BinnedFeatures`),
// so a node only accumulates per-bin counts and sums instead of
// sorting its rows. Candidate thresholds are midpoints between
// consecutive values present in the node; rows with
// x[f] <= threshold go left.
//
// Split quality is Friedman's improvement
//
//   n_l · n_r / (n_l + n_r) · (ȳ_l − ȳ_r)²
//
// and the first (feature, threshold) pair with the strictly
// largest improvement wins. Leaves hold the mean target, which
// the booster later overwrites with its own leaf values.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Per-feature sorted distinct values and each row's bin code.
pub struct BinnedFeatures {
    values: Vec<Vec<f64>>,
    /// n_rows × n_features, index into `values[f]`
    codes: Array2<u32>,
}

impl BinnedFeatures {
    pub fn new(x: &Array2<f64>) -> Self {
        let (n, d) = x.dim();
        let mut values = Vec::with_capacity(d);
        let mut codes = Array2::<u32>::zeros((n, d));

        for (f, column) in x.columns().into_iter().enumerate() {
            let mut distinct: Vec<f64> = column.to_vec();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            for (i, v) in column.iter().enumerate() {
                let code = distinct.partition_point(|d| d.total_cmp(v).is_lt());
                codes[[i, f]] = code as u32;
            }
            values.push(distinct);
        }
        Self { values, codes }
    }

    pub fn n_rows(&self) -> usize {
        self.codes.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct BestSplit {
    feature: usize,
    bin: usize,
    threshold: f64,
    improvement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit on the rows listed in `rows` (duplicates not allowed).
    pub fn fit(
        config: &TreeConfig,
        data: &BinnedFeatures,
        y: &[f64],
        rows: &[usize],
    ) -> AnalysisResult<Self> {
        if y.len() != data.n_rows() {
            return Err(AnalysisError::invalid_config(format!(
                "{} targets for {} rows",
                y.len(),
                data.n_rows()
            )));
        }
        if rows.is_empty() {
            return Err(AnalysisError::insufficient("regression tree fitted on zero rows"));
        }

        let mut tree = Self { nodes: Vec::new() };
        tree.grow(config, data, y, rows.to_vec(), 0);
        Ok(tree)
    }

    /// Appends the subtree for `rows` and returns its node index.
    fn grow(
        &mut self,
        config: &TreeConfig,
        data: &BinnedFeatures,
        y: &[f64],
        rows: Vec<usize>,
        depth: usize,
    ) -> usize {
        let mean = rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64;
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= config.max_depth || rows.len() < config.min_samples_split.max(2) {
            return id;
        }
        let Some(best) = best_split(config, data, y, &rows) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| data.codes[[r, best.feature]] as usize <= best.bin);

        let left = self.grow(config, data, y, left_rows, depth + 1);
        let right = self.grow(config, data, y, right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    /// (leaf index, leaf value) reached by `row`.
    fn descend(&self, row: ArrayView1<'_, f64>) -> (usize, f64) {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return (id, value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    /// Index of the leaf `row` falls into.
    pub fn apply(&self, row: ArrayView1<'_, f64>) -> usize {
        self.descend(row).0
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.descend(row).1
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Overwrite a leaf value; `leaf` must come from [`apply`](Self::apply).
    pub fn set_leaf_value(&mut self, leaf: usize, value: f64) {
        if let Some(Node::Leaf { value: v }) = self.nodes.get_mut(leaf) {
            *v = value;
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

fn best_split(
    config: &TreeConfig,
    data: &BinnedFeatures,
    y: &[f64],
    rows: &[usize],
) -> Option<BestSplit> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&r| y[r]).sum();
    let min_leaf = config.min_samples_leaf.max(1);
    let mut best: Option<BestSplit> = None;

    for f in 0..data.n_features() {
        let n_bins = data.values[f].len();
        if n_bins < 2 {
            continue;
        }
        let mut counts = vec![0usize; n_bins];
        let mut sums = vec![0.0f64; n_bins];
        for &r in rows {
            let b = data.codes[[r, f]] as usize;
            counts[b] += 1;
            sums[b] += y[r];
        }

        let mut n_left = 0usize;
        let mut sum_left = 0.0;
        let mut prev: Option<usize> = None;
        for b in 0..n_bins {
            if counts[b] == 0 {
                continue;
            }
            if let Some(p) = prev {
                // boundary between bin p (left side) and bin b
                let n_right = n - n_left;
                if n_left >= min_leaf && n_right >= min_leaf {
                    let mean_l = sum_left / n_left as f64;
                    let mean_r = (total - sum_left) / n_right as f64;
                    let diff = mean_l - mean_r;
                    let improvement = (n_left * n_right) as f64 / n as f64 * diff * diff;
                    if improvement > 0.0 && best.as_ref().map_or(true, |s| improvement > s.improvement) {
                        let vals = &data.values[f];
                        best = Some(BestSplit {
                            feature: f,
                            bin: p,
                            threshold: (vals[p] + vals[b]) / 2.0,
                            improvement,
                        });
                    }
                }
            }
            n_left += counts[b];
            sum_left += sums[b];
            prev = Some(b);
        }
    }
    best
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn all_rows(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_step_function_is_learned_exactly() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = [0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let data = BinnedFeatures::new(&x);
        let tree = RegressionTree::fit(&TreeConfig::default(), &data, &y, &all_rows(6)).unwrap();

        assert_eq!(tree.predict(&x).to_vec(), y.to_vec());
        // one split at 3.5 is enough
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(array![3.4].view()), 0.0);
        assert_eq!(tree.predict_row(array![3.6].view()), 5.0);
    }

    #[test]
    fn test_depth_is_capped() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();
        let data = BinnedFeatures::new(&x);
        let config = TreeConfig {
            max_depth: 2,
            ..TreeConfig::default()
        };
        let tree = RegressionTree::fit(&config, &data, &y, &all_rows(32)).unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn test_picks_the_informative_feature() {
        // feature 0 is noise, feature 1 decides the target
        let x = array![[1.0, 0.0], [2.0, 0.0], [1.0, 1.0], [2.0, 1.0]];
        let y = [-1.0, -1.0, 1.0, 1.0];
        let data = BinnedFeatures::new(&x);
        let config = TreeConfig {
            max_depth: 1,
            ..TreeConfig::default()
        };
        let tree = RegressionTree::fit(&config, &data, &y, &all_rows(4)).unwrap();
        assert_eq!(tree.predict(&x).to_vec(), y.to_vec());
    }

    #[test]
    fn test_constant_target_stays_a_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let data = BinnedFeatures::new(&x);
        let tree = RegressionTree::fit(&TreeConfig::default(), &data, &[2.0; 3], &all_rows(3)).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(array![9.0].view()), 2.0);
    }

    #[test]
    fn test_fit_on_subset_ignores_other_rows() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 10.0, 100.0, 1000.0];
        let data = BinnedFeatures::new(&x);
        let tree = RegressionTree::fit(&TreeConfig::default(), &data, &y, &[0, 1]).unwrap();
        assert_eq!(tree.predict_row(array![1.0].view()), 0.0);
        assert_eq!(tree.predict_row(array![4.0].view()), 10.0);
    }

    #[test]
    fn test_leaf_values_can_be_overwritten() {
        let x = array![[0.0], [1.0]];
        let data = BinnedFeatures::new(&x);
        let mut tree = RegressionTree::fit(&TreeConfig::default(), &data, &[0.0, 1.0], &all_rows(2)).unwrap();
        let leaf = tree.apply(x.row(1));
        tree.set_leaf_value(leaf, 42.0);
        assert_eq!(tree.predict(&x).to_vec(), vec![0.0, 42.0]);
    }
}
