// ============================================================
// Layer 3 — Debate Domain Type
// ============================================================
// One row of the debate transcript table.
//
// The loader fills `talk_text` and keeps every other column
// untouched in `other`. Two derived columns are filled in
// later by the topic pipeline:
//   - clean_text: the normalised text fed to the vectorizer
//   - cluster:    the K-means label assigned after fitting
//
// Reference: Rust Book §5 (Structs and Methods)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single debate transcript loaded from CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateRecord {
    /// The raw spoken text of the contribution
    pub talk_text: String,

    /// Every other column of the source row, keyed by header name
    pub other: BTreeMap<String, String>,

    /// Lowercased, punctuation-free text (set by the preprocessor step)
    pub clean_text: Option<String>,

    /// Cluster label in [0, k) (set after the final K-means fit)
    pub cluster: Option<usize>,
}

impl DebateRecord {
    /// Create a record with only the transcript text.
    pub fn new(talk_text: impl Into<String>) -> Self {
        Self {
            talk_text: talk_text.into(),
            ..Self::default()
        }
    }

    /// Attach an extra source column.
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.other.insert(name.into(), value.into());
        self
    }

    /// The text the vectorizer should see: the cleaned text if the
    /// preprocessor already ran, otherwise the raw transcript.
    pub fn text_for_vectorizing(&self) -> &str {
        self.clean_text.as_deref().unwrap_or(&self.talk_text)
    }
}
