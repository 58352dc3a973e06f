// ============================================================
// Layer 6 — Projection Writer
// ============================================================
// Writes the 2-D PCA coordinates of every document, with its
// cluster label, to a CSV file. No plot is rendered here; the
// file is the input for an external plotting tool.
//
// Output file: <output-dir>/projection.csv
//
// Example CSV output:
//   pc1,pc2,cluster
//   0.183402,-0.021877,3
//   -0.094113,0.140250,0
//   ...
//
// Rows are in the same order as the surviving debate records.
//
// Reference: csv crate documentation (Writer::serialize)

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PROJECTION_FILE: &str = "projection.csv";

/// One plotted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub pc1: f64,
    pub pc2: f64,
    pub cluster: usize,
}

/// Pair each row of a two-column coordinate matrix with its label.
pub fn projection_rows(coords: &Array2<f64>, labels: &[usize]) -> Result<Vec<ProjectionRow>> {
    anyhow::ensure!(
        coords.ncols() >= 2,
        "projection needs 2 components, got {}",
        coords.ncols()
    );
    anyhow::ensure!(
        coords.nrows() == labels.len(),
        "{} projected rows but {} cluster labels",
        coords.nrows(),
        labels.len()
    );
    Ok(coords
        .rows()
        .into_iter()
        .zip(labels)
        .map(|(row, &cluster)| ProjectionRow {
            pc1: row[0],
            pc2: row[1],
            cluster,
        })
        .collect())
}

/// Writes projection rows to `<dir>/projection.csv`, replacing any
/// earlier file.
pub struct ProjectionWriter {
    csv_path: PathBuf,
}

impl ProjectionWriter {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self {
            csv_path: dir.join(PROJECTION_FILE),
        })
    }

    pub fn write(&self, rows: &[ProjectionRow]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("Cannot write '{}'", self.csv_path.display()))?;

        tracing::info!(
            "Wrote {} projected documents to '{}'",
            rows.len(),
            self.csv_path.display()
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
