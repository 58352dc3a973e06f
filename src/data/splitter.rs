// ============================================================
// Layer 4 — Stratified Splitters
// ============================================================
// Two ways of carving a labelled dataset into train/test index
// sets, both preserving class proportions:
//
//   stratified_split   — one shuffled hold-out split (e.g. 80/20),
//                        seeded so the same seed gives the same split
//   stratified_k_fold  — k unshuffled folds for cross-validation;
//                        each class is dealt out to the folds in
//                        its original row order
//
// Both work on label slices and return row indices, so callers
// keep ownership of the samples and just index into them.
//
// Every bucket keeps roughly the same share in each part as in
// the whole table. KRK buckets are unbalanced: draws and long
// mates are rare.
//
// Reference: rand crate documentation (SliceRandom, StdRng)

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::{AnalysisError, AnalysisResult};

/// Row indices of one train/test partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Row indices grouped by label, labels in ascending order.
fn indices_by_class(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }
    by_class
}

/// Distribute `total` test slots across classes in proportion to their
/// sizes: floor first, then hand out the remainder by largest fraction
/// (ties go to the lower label).
fn allocate_test_counts(class_sizes: &[usize], n_samples: usize, total: usize) -> Vec<usize> {
    let exact: Vec<f64> = class_sizes
        .iter()
        .map(|&size| size as f64 * total as f64 / n_samples as f64)
        .collect();
    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut remaining = total.saturating_sub(counts.iter().sum());
    let mut order: Vec<usize> = (0..class_sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });

    for &class in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        // Keep at least one row of every class on the training side.
        if counts[class] + 1 < class_sizes[class] {
            counts[class] += 1;
            remaining -= 1;
        }
    }
    counts
}

/// Shuffled, stratified hold-out split.
///
/// `test_fraction` of the rows (rounded up) go to the test side. Every
/// class must have at least two rows, and both sides must be able to
/// hold one row per class.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> AnalysisResult<SplitIndices> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AnalysisError::invalid_config(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n = labels.len();
    let by_class = indices_by_class(labels);
    let n_classes = by_class.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    let n_train = n - n_test.min(n);

    if let Some((label, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(AnalysisError::insufficient(format!(
            "class {label} has only {} row(s); stratified splitting needs at least 2",
            rows.len()
        )));
    }
    if n_test < n_classes || n_train < n_classes {
        return Err(AnalysisError::insufficient(format!(
            "a {n_train}/{n_test} split cannot hold all {n_classes} classes on both sides"
        )));
    }

    let sizes: Vec<usize> = by_class.values().map(Vec::len).collect();
    let test_counts = allocate_test_counts(&sizes, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = SplitIndices {
        train: Vec::with_capacity(n_train),
        test: Vec::with_capacity(n_test),
    };

    for (mut rows, take) in by_class.into_values().zip(test_counts) {
        rows.shuffle(&mut rng);
        let train_part = rows.split_off(take);
        split.test.extend(rows);
        split.train.extend(train_part);
    }

    split.train.shuffle(&mut rng);
    split.test.shuffle(&mut rng);

    tracing::debug!(
        "Stratified split: {} train, {} test across {} classes",
        split.train.len(),
        split.test.len(),
        n_classes
    );
    Ok(split)
}

/// Unshuffled stratified k-fold.
///
/// Rows are sorted by label and dealt round-robin to folds to decide how
/// many rows of each class each fold receives; each class then fills its
/// folds in original row order. Train and test indices are ascending.
pub fn stratified_k_fold(labels: &[usize], n_splits: usize) -> AnalysisResult<Vec<SplitIndices>> {
    let n = labels.len();
    if n_splits < 2 {
        return Err(AnalysisError::invalid_config(format!(
            "k-fold needs at least 2 splits, got {n_splits}"
        )));
    }
    if n_splits > n {
        return Err(AnalysisError::insufficient(format!(
            "cannot make {n_splits} folds from {n} rows"
        )));
    }

    let by_class = indices_by_class(labels);
    let largest = by_class.values().map(Vec::len).max().unwrap_or(0);
    let smallest = by_class.values().map(Vec::len).min().unwrap_or(0);
    if largest < n_splits {
        return Err(AnalysisError::insufficient(format!(
            "{n_splits} folds is more than the number of rows in every class"
        )));
    }
    if smallest < n_splits {
        tracing::warn!(
            "The least populated class has only {} rows, fewer than {} folds",
            smallest,
            n_splits
        );
    }

    // allocation[fold][class]: rows of `class` in fold `fold`
    let class_pos: BTreeMap<usize, usize> = by_class
        .keys()
        .enumerate()
        .map(|(pos, &label)| (label, pos))
        .collect();
    let mut sorted: Vec<usize> = labels.iter().map(|l| class_pos[l]).collect();
    sorted.sort_unstable();

    let mut allocation = vec![vec![0usize; by_class.len()]; n_splits];
    for (i, &class) in sorted.iter().enumerate() {
        allocation[i % n_splits][class] += 1;
    }

    let mut fold_of = vec![0usize; n];
    for (class, rows) in by_class.values().enumerate() {
        let mut cursor = rows.iter();
        for (fold, per_class) in allocation.iter().enumerate() {
            for &row in cursor.by_ref().take(per_class[class]) {
                fold_of[row] = fold;
            }
        }
    }

    let folds = (0..n_splits)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..n).partition(|&row| fold_of[row] == fold);
            SplitIndices { train, test }
        })
        .collect();
    Ok(folds)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn count(labels: &[usize], rows: &[usize], class: usize) -> usize {
        rows.iter().filter(|&&r| labels[r] == class).count()
    }

    #[test]
    fn test_split_sizes_and_proportions() {
        // 60 of class 0, 40 of class 1
        let labels: Vec<usize> = (0..100).map(|i| usize::from(i >= 60)).collect();
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        assert_eq!(count(&labels, &split.test, 0), 12);
        assert_eq!(count(&labels, &split.test, 1), 8);
    }

    #[test]
    fn test_split_preserves_every_row_once() {
        let labels: Vec<usize> = (0..53).map(|i| i % 3).collect();
        let split = stratified_split(&labels, 0.25, 7).unwrap();

        let all: HashSet<usize> = split.train.iter().chain(&split.test).copied().collect();
        assert_eq!(all.len(), 53);
        assert_eq!(split.train.len() + split.test.len(), 53);
    }

    #[test]
    fn test_split_is_reproducible_for_a_seed() {
        let labels: Vec<usize> = (0..40).map(|i| i % 4).collect();
        let a = stratified_split(&labels, 0.2, 99).unwrap();
        let b = stratified_split(&labels, 0.2, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_singleton_class() {
        let labels = vec![0, 0, 0, 0, 1];
        assert!(matches!(
            stratified_split(&labels, 0.2, 1),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(stratified_split(&[0, 1, 0, 1], 1.0, 1).is_err());
        assert!(stratified_split(&[0, 1, 0, 1], 0.0, 1).is_err());
    }

    #[test]
    fn test_k_fold_partitions_rows() {
        let labels: Vec<usize> = (0..50).map(|i| i % 2).collect();
        let folds = stratified_k_fold(&labels, 5).unwrap();

        assert_eq!(folds.len(), 5);
        let mut seen = vec![0usize; 50];
        for fold in &folds {
            assert_eq!(fold.test.len(), 10);
            assert_eq!(fold.train.len(), 40);
            assert_eq!(count(&labels, &fold.test, 0), 5);
            for &row in &fold.test {
                seen[row] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_k_fold_stratifies_sorted_labels() {
        // Labels sorted by class, as in the KRK table
        let labels: Vec<usize> = (0..30).map(|i| i / 10).collect();
        let folds = stratified_k_fold(&labels, 5).unwrap();
        for fold in &folds {
            for class in 0..3 {
                assert_eq!(count(&labels, &fold.test, class), 2);
            }
        }
        // first fold takes the first rows of each class
        assert_eq!(folds[0].test, vec![0, 1, 10, 11, 20, 21]);
    }

    #[test]
    fn test_k_fold_rejects_too_many_splits() {
        assert!(stratified_k_fold(&[0, 1, 0], 5).is_err());
        assert!(stratified_k_fold(&[0, 1, 0, 1], 1).is_err());
    }
}
