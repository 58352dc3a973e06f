// ============================================================
// Layer 3 — Endgame Domain Types
// ============================================================
// A king+rook vs king (KRK) position is six coordinates:
//
//   white king (file, rank)
//   white rook (file, rank)
//   black king (file, rank)
//
// plus the outcome label `white_depth_of_win`, a word such as
// "draw", "zero", "seven" or "sixteen" (moves to mate).
//
// RawPosition is what the CSV loader produces. EncodedPosition
// is what the classifier consumes: file letters become 1..=8 and
// the outcome word becomes one of five ordinal OutcomeBuckets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source column names, in the order the classifier expects them.
pub const FILE_COLUMNS: [&str; 3] = ["white_king_file", "white_rook_file", "black_king_file"];
pub const RANK_COLUMNS: [&str; 3] = ["white_king_rank", "white_rook_rank", "black_king_rank"];
pub const OUTCOME_COLUMN: &str = "white_depth_of_win";

/// A complete endgame row as read from disk (no missing fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosition {
    pub white_king_file: String,
    pub white_king_rank: i64,
    pub white_rook_file: String,
    pub white_rook_rank: i64,
    pub black_king_file: String,
    pub black_king_rank: i64,
    pub white_depth_of_win: String,
}

impl RawPosition {
    /// File letters in FILE_COLUMNS order.
    pub fn files(&self) -> [&str; 3] {
        [
            &self.white_king_file,
            &self.white_rook_file,
            &self.black_king_file,
        ]
    }

    /// Ranks in RANK_COLUMNS order.
    pub fn ranks(&self) -> [i64; 3] {
        [self.white_king_rank, self.white_rook_rank, self.black_king_rank]
    }
}

/// Depth-of-win collapsed into five ordinal buckets.
///
/// Stored as `i8` to match the compact label column of the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum OutcomeBucket {
    /// "draw"
    Draw = 0,
    /// mate in zero to four moves
    Depth0To4 = 1,
    /// mate in five to eight moves
    Depth5To8 = 2,
    /// mate in nine to twelve moves
    Depth9To12 = 3,
    /// mate in thirteen to sixteen moves
    Depth13To16 = 4,
}

impl OutcomeBucket {
    pub const ALL: [OutcomeBucket; 5] = [
        OutcomeBucket::Draw,
        OutcomeBucket::Depth0To4,
        OutcomeBucket::Depth5To8,
        OutcomeBucket::Depth9To12,
        OutcomeBucket::Depth13To16,
    ];

    pub fn as_i8(self) -> i8 {
        self as i8
    }

    /// Class index used by the classifier (0..5).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short human-readable name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            OutcomeBucket::Draw => "draw",
            OutcomeBucket::Depth0To4 => "0-4",
            OutcomeBucket::Depth5To8 => "5-8",
            OutcomeBucket::Depth9To12 => "9-12",
            OutcomeBucket::Depth13To16 => "13-16",
        }
    }
}

impl fmt::Display for OutcomeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A position ready for the column transform: files as 1..=8,
/// ranks as 1..=8, outcome as its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedPosition {
    /// white king, white rook, black king
    pub files: [u8; 3],
    /// white king, white rook, black king
    pub ranks: [u8; 3],
    pub outcome: OutcomeBucket,
}
