// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the two
// datasets this tool analyses:
//
//   debate.rs   — one parliamentary debate transcript row
//   endgame.rs  — one king+rook vs king position and its
//                 depth-of-win outcome bucket
//   error.rs    — typed failures raised by the data and ML layers
//   traits.rs   — seams the application layer programs against
//
// Rules for this layer:
//   - NO file I/O
//   - NO numerical code
//   - Only data definitions and small invariants
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// A debate transcript row, annotated as the topic pipeline runs
pub mod debate;

/// Endgame positions, raw and encoded, plus the outcome buckets
pub mod endgame;

/// AnalysisError — every failure the pipelines raise on purpose
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
