// ============================================================
// Layer 2 — EndgameUseCase
// ============================================================
// Orchestrates the KRK endgame classification pipeline:
//
//   Step 1: Load positions                    (Layer 4 - data)
//   Step 2: Encode files + outcome buckets    (Layer 4 - data)
//   Step 3: k-fold cross-validated accuracy   (Layer 5 - ml)
//   Step 4: Stratified hold-out split         (Layer 4 - data)
//   Step 5: Fit on train, predict test        (Layer 5 - ml)
//   Step 6: Classification report + confusion matrix (Layer 5 - ml)
//   Step 7: Export (only with --output-dir)   (Layer 6 - infra)
//
// One seed drives both the hold-out split and the booster, so a
// run is fully repeatable.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{encoder::FeatureEncoder, loader::EndgameCsvLoader, splitter::stratified_split};
use crate::domain::{
    endgame::{EncodedPosition, OutcomeBucket, RawPosition},
    error::AnalysisError,
    traits::{Classifier, RecordSource},
};
use crate::infra::report_store::{ReportStore, ENDGAME_REPORT_FILE};
use crate::ml::{
    boosting::BoostingConfig,
    evaluation::{cross_val_accuracy, ClassificationReport, ConfusionMatrix, CvScores},
    pipeline::EndgameClassifier,
};

// ─── Endgame Configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndgameConfig {
    pub positions_path: String,
    pub folds:          usize,
    pub test_fraction:  f64,
    pub seed:           u64,
    pub n_estimators:   usize,
    pub learning_rate:  f64,
    pub max_depth:      usize,
    pub subsample:      f64,
    pub output_dir:     Option<String>,
}

impl Default for EndgameConfig {
    fn default() -> Self {
        Self {
            positions_path: "data/king_rook_vs_king.csv".to_string(),
            folds:          5,
            test_fraction:  0.2,
            seed:           42,
            n_estimators:   100,
            learning_rate:  0.1,
            max_depth:      3,
            subsample:      1.0,
            output_dir:     None,
        }
    }
}

impl EndgameConfig {
    fn boosting(&self) -> BoostingConfig {
        BoostingConfig {
            n_estimators: self.n_estimators,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            subsample: self.subsample,
            seed: self.seed,
        }
    }
}

// ─── Endgame Report ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: OutcomeBucket,
    pub count: usize,
}

/// Everything the endgame pipeline prints, in serialisable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndgameReport {
    pub n_positions: usize,
    /// Buckets present in the data, in bucket order
    pub class_distribution: Vec<BucketCount>,
    pub cv: CvScores,
    pub cv_mean: f64,
    pub cv_std: f64,
    pub train_size: usize,
    pub test_size: usize,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

// ─── EndgameUseCase ──────────────────────────────────────────────────────────
pub struct EndgameUseCase {
    config: EndgameConfig,
}

impl EndgameUseCase {
    pub fn new(config: EndgameConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EndgameReport> {
        // ── Step 1: Load positions ───────────────────────────────────────────
        tracing::info!("Loading endgame positions from '{}'", self.config.positions_path);
        let positions = EndgameCsvLoader::new(&self.config.positions_path).load_all()?;

        let report = self.analyse(&positions)?;

        // ── Step 7: Optional export ──────────────────────────────────────────
        if let Some(dir) = &self.config.output_dir {
            ReportStore::new(dir)?.save(ENDGAME_REPORT_FILE, &report)?;
        }
        Ok(report)
    }

    /// Steps 2–6 on positions that are already in memory.
    pub fn analyse(&self, positions: &[RawPosition]) -> Result<EndgameReport> {
        if positions.is_empty() {
            return Err(AnalysisError::EmptyInput(
                "no complete endgame positions remain after loading".into(),
            )
            .into());
        }

        // ── Step 2: Encode ───────────────────────────────────────────────────
        let encoded = FeatureEncoder::new()
            .encode_all(positions)
            .context("Encoding endgame positions failed")?;
        let labels: Vec<usize> = encoded.iter().map(|p| p.outcome.index()).collect();
        let class_distribution = bucket_counts(&encoded);
        for c in &class_distribution {
            tracing::info!("  bucket {:>5}: {} positions", c.bucket.name(), c.count);
        }

        // ── Step 3: Cross-validation ─────────────────────────────────────────
        let boosting = self.config.boosting();
        let cv = cross_val_accuracy(
            || EndgameClassifier::new(boosting.clone()),
            &encoded,
            &labels,
            self.config.folds,
        )
        .context("Cross-validation failed")?;
        tracing::info!(
            "{}-fold CV accuracy: {:.4} ± {:.4}",
            self.config.folds,
            cv.mean(),
            cv.std()
        );

        // ── Step 4: Hold-out split ───────────────────────────────────────────
        let split = stratified_split(&labels, self.config.test_fraction, self.config.seed)
            .context("Stratified train/test split failed")?;
        let pick = |rows: &[usize]| -> (Vec<EncodedPosition>, Vec<usize>) {
            rows.iter().map(|&i| (encoded[i], labels[i])).unzip()
        };
        let (train_x, train_y) = pick(&split.train);
        let (test_x, test_y) = pick(&split.test);

        // ── Step 5: Fit and predict ──────────────────────────────────────────
        let mut classifier = EndgameClassifier::new(boosting);
        classifier
            .fit(&train_x, &train_y)
            .context("Fitting the endgame classifier failed")?;
        let predicted = classifier.predict(&test_x)?;

        // ── Step 6: Metrics ──────────────────────────────────────────────────
        let report = ClassificationReport::compute(&test_y, &predicted)?;
        let confusion = ConfusionMatrix::compute(&test_y, &predicted)?;
        tracing::info!("Hold-out accuracy: {:.4}", report.accuracy);

        Ok(EndgameReport {
            n_positions: encoded.len(),
            class_distribution,
            cv_mean: cv.mean(),
            cv_std: cv.std(),
            cv,
            train_size: train_y.len(),
            test_size: test_y.len(),
            report,
            confusion,
        })
    }
}

fn bucket_counts(encoded: &[EncodedPosition]) -> Vec<BucketCount> {
    OutcomeBucket::ALL
        .iter()
        .map(|&bucket| BucketCount {
            bucket,
            count: encoded.iter().filter(|p| p.outcome == bucket).count(),
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Display name for a class index in reports.
pub fn bucket_name(index: usize) -> String {
    OutcomeBucket::from_index(index)
        .map(|b| b.name().to_string())
        .unwrap_or_else(|| index.to_string())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::evaluation::majority_baseline;
    use std::io::Write;

    const FILES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

    /// Separable table: the outcome word is decided by the white
    /// king's file, every other field varies freely.
    fn positions() -> Vec<RawPosition> {
        let mut out = Vec::new();
        for (f, wkf) in FILES.iter().enumerate() {
            for rank in 1..=8i64 {
                let outcome = match f {
                    0 | 1 => "draw",
                    2 | 3 => "three",
                    4 | 5 => "seven",
                    _ => "fourteen",
                };
                out.push(RawPosition {
                    white_king_file: wkf.to_string(),
                    white_king_rank: rank,
                    white_rook_file: FILES[(f + rank as usize) % 8].to_string(),
                    white_rook_rank: (rank % 8) + 1,
                    black_king_file: FILES[(f * 3 + rank as usize) % 8].to_string(),
                    black_king_rank: ((rank + 4) % 8) + 1,
                    white_depth_of_win: outcome.to_string(),
                });
            }
        }
        out
    }

    fn fast() -> EndgameConfig {
        EndgameConfig {
            n_estimators: 30,
            ..EndgameConfig::default()
        }
    }

    #[test]
    fn test_separable_table_end_to_end() {
        let report = EndgameUseCase::new(fast()).analyse(&positions()).unwrap();

        let labels: Vec<usize> = positions()
            .iter()
            .map(|p| crate::data::encoder::recode_outcome(&p.white_depth_of_win).unwrap().index())
            .collect();
        assert!(report.cv_mean > majority_baseline(&labels));
        assert_eq!(report.cv.scores.len(), 5);

        assert_eq!(report.n_positions, 64);
        assert_eq!(report.test_size, 13);
        assert_eq!(report.train_size, 51);
        let present = report.class_distribution.len();
        assert_eq!(present, 4);
        assert_eq!(report.confusion.dim(), present);
        assert!(report.confusion.counts.iter().all(|row| row.len() == present));
    }

    #[test]
    fn test_runs_are_repeatable() {
        let a = EndgameUseCase::new(fast()).analyse(&positions()).unwrap();
        let b = EndgameUseCase::new(fast()).analyse(&positions()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_outcome_word_fails_loudly() {
        let mut data = positions();
        data[3].white_depth_of_win = "seventeen".into();
        let err = EndgameUseCase::new(fast()).analyse(&data).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::UnrecognizedLabel(l)) if l == "seventeen"
        ));
    }

    #[test]
    fn test_no_positions_is_an_error() {
        assert!(EndgameUseCase::new(fast()).analyse(&[]).is_err());
    }

    fn write_positions(dir: &std::path::Path) -> String {
        let path = dir.join("krk.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "white_king_file,white_king_rank,white_rook_file,white_rook_rank,\
             black_king_file,black_king_rank,white_depth_of_win"
        )
        .unwrap();
        for p in positions() {
            writeln!(
                f,
                "{},{},{},{},{},{},{}",
                p.white_king_file,
                p.white_king_rank,
                p.white_rook_file,
                p.white_rook_rank,
                p.black_king_file,
                p.black_king_rank,
                p.white_depth_of_win
            )
            .unwrap();
        }
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_execute_writes_report_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let cfg = EndgameConfig {
            positions_path: write_positions(dir.path()),
            output_dir: Some(out.to_string_lossy().into_owned()),
            ..fast()
        };
        let report = EndgameUseCase::new(cfg).execute().unwrap();

        let saved: serde_json::Value =
            ReportStore::new(&out).unwrap().load(ENDGAME_REPORT_FILE).unwrap();
        assert_eq!(saved["n_positions"], report.n_positions);
        assert_eq!(saved["test_size"], report.test_size);
    }

    #[test]
    fn test_execute_without_output_dir_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EndgameConfig {
            positions_path: write_positions(dir.path()),
            output_dir: None,
            ..fast()
        };
        let report = EndgameUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.n_positions, 64);

        let entries: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, ["krk.csv"]);
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(bucket_name(0), "draw");
        assert_eq!(bucket_name(4), "13-16");
        assert_eq!(bucket_name(9), "9");
    }
}
