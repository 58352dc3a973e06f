// ============================================================
// Layer 4 — CSV Loaders
// ============================================================
// Reads the two input tables with the `csv` crate.
//
//   DebateCsvLoader  — debates_2022.csv, needs a `talk_text` column
//   EndgameCsvLoader — king_rook_vs_king.csv, needs the six
//                      *_file / *_rank columns and
//                      `white_depth_of_win`
//
// Missing values follow the usual dataframe convention: an empty
// field or one of the common NA markers ("NA", "NaN", "null", ...)
// counts as missing. Debate rows missing their text and endgame
// rows missing any required field are dropped, not failed.
//
// A required column absent from the header is a hard error:
// nothing downstream can work without it.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};

use crate::domain::debate::DebateRecord;
use crate::domain::endgame::{RawPosition, FILE_COLUMNS, OUTCOME_COLUMN, RANK_COLUMNS};
use crate::domain::error::AnalysisError;
use crate::domain::traits::RecordSource;

/// Header of the transcript column in the debates table.
pub const TALK_TEXT_COLUMN: &str = "talk_text";

/// Field values treated as missing, in addition to the empty string.
const MISSING_MARKERS: [&str; 10] = [
    "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>", "#N/A",
];

fn is_missing(field: &str) -> bool {
    field.is_empty() || MISSING_MARKERS.contains(&field)
}

/// Find the index of `column` in `headers`, or fail with MissingColumn.
fn require_column(headers: &StringRecord, column: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| AnalysisError::missing_column(column, path.display().to_string()).into())
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Cannot open CSV file '{}'", path.display()))
}

// ─── Debates ──────────────────────────────────────────────────────────────────

/// Loads debate transcripts, keeping every column of each row.
pub struct DebateCsvLoader {
    path: PathBuf,
}

impl DebateCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource<DebateRecord> for DebateCsvLoader {
    fn load_all(&self) -> Result<Vec<DebateRecord>> {
        let mut reader = open_reader(&self.path)?;
        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
            .clone();
        let text_idx = require_column(&headers, TALK_TEXT_COLUMN, &self.path)?;

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (line, row) in reader.records().enumerate() {
            let row = row.with_context(|| {
                format!("Malformed row {} in '{}'", line + 1, self.path.display())
            })?;

            let text = row.get(text_idx).unwrap_or("");
            if is_missing(text) {
                dropped += 1;
                continue;
            }

            let mut record = DebateRecord::new(text);
            for (idx, (name, value)) in headers.iter().zip(row.iter()).enumerate() {
                if idx != text_idx {
                    record.other.insert(name.to_string(), value.to_string());
                }
            }
            records.push(record);
        }

        tracing::info!(
            "Loaded {} debate records from '{}' ({} dropped for missing text)",
            records.len(),
            self.path.display(),
            dropped
        );
        Ok(records)
    }
}

// ─── Endgame positions ────────────────────────────────────────────────────────

/// Loads KRK endgame positions, dropping incomplete rows.
pub struct EndgameCsvLoader {
    path: PathBuf,
}

impl EndgameCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Column indices of the seven required fields.
struct PositionColumns {
    files: [usize; 3],
    ranks: [usize; 3],
    outcome: usize,
}

impl PositionColumns {
    fn locate(headers: &StringRecord, path: &Path) -> Result<Self> {
        let mut files = [0usize; 3];
        let mut ranks = [0usize; 3];
        for (slot, name) in files.iter_mut().zip(FILE_COLUMNS) {
            *slot = require_column(headers, name, path)?;
        }
        for (slot, name) in ranks.iter_mut().zip(RANK_COLUMNS) {
            *slot = require_column(headers, name, path)?;
        }
        let outcome = require_column(headers, OUTCOME_COLUMN, path)?;
        Ok(Self { files, ranks, outcome })
    }

    /// Build a RawPosition, or None if any required field is missing.
    fn extract(&self, row: &StringRecord, line: usize) -> Result<Option<RawPosition>> {
        let field = |idx: usize| row.get(idx).map(str::trim).filter(|f| !is_missing(f));

        let (Some(wkf), Some(wrf), Some(bkf)) = (
            field(self.files[0]),
            field(self.files[1]),
            field(self.files[2]),
        ) else {
            return Ok(None);
        };
        let (Some(wkr), Some(wrr), Some(bkr)) = (
            field(self.ranks[0]),
            field(self.ranks[1]),
            field(self.ranks[2]),
        ) else {
            return Ok(None);
        };
        let Some(outcome) = field(self.outcome) else {
            return Ok(None);
        };

        let parse_rank = |value: &str, column: &str| -> Result<i64> {
            value
                .parse::<i64>()
                .with_context(|| format!("Row {line}: '{value}' in column '{column}' is not an integer"))
        };

        Ok(Some(RawPosition {
            white_king_file: wkf.to_string(),
            white_king_rank: parse_rank(wkr, RANK_COLUMNS[0])?,
            white_rook_file: wrf.to_string(),
            white_rook_rank: parse_rank(wrr, RANK_COLUMNS[1])?,
            black_king_file: bkf.to_string(),
            black_king_rank: parse_rank(bkr, RANK_COLUMNS[2])?,
            white_depth_of_win: outcome.to_string(),
        }))
    }
}

impl RecordSource<RawPosition> for EndgameCsvLoader {
    fn load_all(&self) -> Result<Vec<RawPosition>> {
        let mut reader = open_reader(&self.path)?;
        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
            .clone();
        let columns = PositionColumns::locate(&headers, &self.path)?;

        let mut positions = Vec::new();
        let mut dropped = 0usize;

        for (line, row) in reader.records().enumerate() {
            let row = row.with_context(|| {
                format!("Malformed row {} in '{}'", line + 1, self.path.display())
            })?;
            match columns.extract(&row, line + 1)? {
                Some(position) => positions.push(position),
                None => dropped += 1,
            }
        }

        tracing::info!(
            "Loaded {} endgame positions from '{}' ({} incomplete rows dropped)",
            positions.len(),
            self.path.display(),
            dropped
        );
        Ok(positions)
    }
}
