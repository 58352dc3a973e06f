// ============================================================
// Layer 5 — ML Layer
// ============================================================
// All numerical code lives here, built on ndarray. No other
// layer does any linear algebra.
//
// Topic pipeline:
//
//   sparse.rs     — CSR matrix for TF-IDF rows
//   tfidf.rs      — tokenizer, stop words, n-grams, DF filter,
//                   smooth idf, L2-normalised rows
//   kmeans.rs     — k-means++ seeding + Lloyd iterations
//   silhouette.rs — cluster quality on a seeded row sample
//   k_selector.rs — scans k and keeps the best silhouette
//   clusterer.rs  — final fit and top terms per cluster
//   pca.rs        — 2-D projection without densifying
//
// Endgame pipeline:
//
//   one_hot.rs    — ColumnTransform (one-hot files, raw ranks)
//   tree.rs       — CART regression tree
//   boosting.rs   — multinomial gradient boosting
//   pipeline.rs   — ColumnTransform + booster as one Classifier
//   evaluation.rs — cross-validation, report, confusion matrix
//
// Reference: Hastie, Tibshirani & Friedman, The Elements of
//            Statistical Learning §10 (Boosting), §14 (Clustering)

/// Compressed sparse row matrix
pub mod sparse;

/// TF-IDF vectorizer
pub mod tfidf;

pub mod kmeans;

pub mod silhouette;

/// Silhouette-based choice of the number of topics
pub mod k_selector;

/// Final clustering and top-term report
pub mod clusterer;

/// Principal component projection for plotting
pub mod pca;

/// One-hot column transform for endgame features
pub mod one_hot;

pub mod tree;

/// Gradient-boosted trees
pub mod boosting;

/// Column transform + booster as a single classifier
pub mod pipeline;

/// Cross-validation and classification metrics
pub mod evaluation;
