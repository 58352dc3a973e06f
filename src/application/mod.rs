// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to run one
// analysis pipeline end to end.
//
// Rules for this layer:
//   - No ML math here (that's Layer 5)
//   - No printing here (that's Layer 1); use cases return
//     serialisable reports and the CLI decides how to show them
//   - File access only through Layer 4 loaders and Layer 6
//     exporters
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Debate transcripts → topics
pub mod topics_use_case;

// KRK endgame positions → outcome classifier
pub mod endgame_use_case;
