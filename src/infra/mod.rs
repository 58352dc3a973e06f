// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Optional file output, only used when --output-dir is given:
//
//   report_store.rs      — JSON reports
//                          topics_report.json and
//                          endgame_report.json, written with
//                          serde_json so they can be diffed
//                          between runs or loaded back.
//
//   projection_writer.rs — PCA coordinates per document
//                          projection.csv (pc1, pc2, cluster),
//                          written with the csv crate for
//                          plotting in any spreadsheet or
//                          notebook.
//
// Nothing is written to disk by default; every other layer
// works purely in memory.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// JSON report saving and loading
pub mod report_store;

/// 2-D projection CSV writer
pub mod projection_writer;
