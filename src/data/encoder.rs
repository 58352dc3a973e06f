// ============================================================
// Layer 4 — Feature Encoder
// ============================================================
// Turns RawPositions into EncodedPositions:
//
//   file letters  'a'..'h'  →  1..8   (each file column independently)
//   ranks          1..8     →  1..8   (validated, passed through)
//   depth-of-win word       →  OutcomeBucket
//
// The outcome vocabulary is closed: "draw" plus the depths
// "zero" through "sixteen", collapsed into five buckets.
//
//   draw                          → 0  Draw
//   zero  one   two   three four  → 1  Depth0To4
//   five  six   seven eight       → 2  Depth5To8
//   nine  ten   eleven twelve     → 3  Depth9To12
//   thirteen fourteen fifteen sixteen → 4  Depth13To16
//
// Anything else is an UnrecognizedLabel error.

use crate::domain::endgame::{EncodedPosition, OutcomeBucket, RawPosition};
use crate::domain::error::{AnalysisError, AnalysisResult};

/// Map a chessboard file letter to 1..=8.
pub fn file_to_index(file: &str) -> AnalysisResult<u8> {
    match file.trim() {
        "a" => Ok(1),
        "b" => Ok(2),
        "c" => Ok(3),
        "d" => Ok(4),
        "e" => Ok(5),
        "f" => Ok(6),
        "g" => Ok(7),
        "h" => Ok(8),
        other => Err(AnalysisError::UnrecognizedFile(other.to_string())),
    }
}

/// Map a depth-of-win word to its outcome bucket.
pub fn recode_outcome(label: &str) -> AnalysisResult<OutcomeBucket> {
    let bucket = match label.trim() {
        "draw" => OutcomeBucket::Draw,
        "zero" | "one" | "two" | "three" | "four" => OutcomeBucket::Depth0To4,
        "five" | "six" | "seven" | "eight" => OutcomeBucket::Depth5To8,
        "nine" | "ten" | "eleven" | "twelve" => OutcomeBucket::Depth9To12,
        "thirteen" | "fourteen" | "fifteen" | "sixteen" => OutcomeBucket::Depth13To16,
        other => return Err(AnalysisError::UnrecognizedLabel(other.to_string())),
    };
    Ok(bucket)
}

fn check_rank(rank: i64) -> AnalysisResult<u8> {
    match u8::try_from(rank) {
        Ok(r) if (1..=8).contains(&r) => Ok(r),
        _ => Err(AnalysisError::InvalidRank(rank)),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, position: &RawPosition) -> AnalysisResult<EncodedPosition> {
        let [wkf, wrf, bkf] = position.files();
        let [wkr, wrr, bkr] = position.ranks();

        Ok(EncodedPosition {
            files: [file_to_index(wkf)?, file_to_index(wrf)?, file_to_index(bkf)?],
            ranks: [check_rank(wkr)?, check_rank(wrr)?, check_rank(bkr)?],
            outcome: recode_outcome(&position.white_depth_of_win)?,
        })
    }

    /// Encode every position, failing on the first bad one.
    pub fn encode_all(&self, positions: &[RawPosition]) -> AnalysisResult<Vec<EncodedPosition>> {
        let encoded = positions
            .iter()
            .map(|p| self.encode(p))
            .collect::<AnalysisResult<Vec<_>>>()?;
        tracing::debug!("Encoded {} positions", encoded.len());
        Ok(encoded)
    }
}
