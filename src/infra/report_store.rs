// ============================================================
// Layer 6 — Report Store
// ============================================================
// Writes pipeline reports as pretty-printed JSON into the
// directory given by --output-dir.
//
// File naming convention:
//   <output-dir>/
//     topics_report.json    ← best k, k scan, top terms, PCA variance
//     endgame_report.json   ← CV scores, classification report,
//                             confusion matrix
//
// Reports are plain serde structs, so any of them can be read
// back with `load`.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation (to_string_pretty)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const TOPICS_REPORT_FILE: &str = "topics_report.json";
pub const ENDGAME_REPORT_FILE: &str = "endgame_report.json";

/// Saves and loads JSON reports under one directory.
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Create the store, creating the directory (like `mkdir -p`) if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Serialise `report` to `<dir>/<file_name>` and return the path.
    pub fn save<T: Serialize>(&self, file_name: &str, report: &T) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(report)
            .with_context(|| format!("Cannot serialise report for '{}'", path.display()))?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write report to '{}'", path.display()))?;

        tracing::info!("Saved report to '{}'", path.display());
        Ok(path)
    }

    pub fn load<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let path = self.dir.join(file_name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read report from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed report in '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::evaluation::CvScores;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("nested/out")).unwrap();
        let cv = CvScores {
            scores: vec![0.5, 0.75],
        };

        let path = store.save(ENDGAME_REPORT_FILE, &cv).unwrap();
        assert!(path.ends_with(ENDGAME_REPORT_FILE));
        assert_eq!(store.load::<CvScores>(ENDGAME_REPORT_FILE).unwrap(), cv);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path()).unwrap();
        assert!(store.load::<CvScores>("absent.json").is_err());
    }
}
