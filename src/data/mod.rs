// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a CSV file on disk and the inputs the
// ML layer expects.
//
//   Topic pipeline:
//     debates_2022.csv
//         │
//         ▼
//     DebateCsvLoader   → DebateRecords (rows without text dropped)
//         │
//         ▼
//     Preprocessor      → clean_text (lowercase, no punctuation)
//
//   Endgame pipeline:
//     king_rook_vs_king.csv
//         │
//         ▼
//     EndgameCsvLoader  → RawPositions (incomplete rows dropped)
//         │
//         ▼
//     FeatureEncoder    → EncodedPositions (files 1..8, outcome buckets)
//         │
//         ▼
//     splitter          → stratified hold-out split / k folds
//
// Reference: Rust Book §13 (Iterators and Closures)

/// CSV readers for both input tables
pub mod loader;

/// Lowercasing and punctuation stripping for transcripts
pub mod preprocessor;

/// File-letter and outcome-label encoding for endgame positions
pub mod encoder;

/// Stratified train/test splits and k-fold partitions
pub mod splitter;
