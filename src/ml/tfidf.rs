// ============================================================
// Layer 5 — TF-IDF Vectorizer
// ============================================================
// Turns cleaned transcripts into a sparse term-document matrix.
//
//   1. Tokenize: runs of two or more word characters
//   2. Drop English stop words (unless disabled)
//   3. Build n-grams over the surviving tokens (unigrams + bigrams)
//   4. Count document frequency per term; drop terms that appear
//      in fewer than `min_df` documents or in more than
//      `max_df` (a fraction) of them; optionally keep only the
//      `max_features` most frequent terms
//   5. Vocabulary = surviving terms in alphabetical order
//   6. Weight = raw count × idf, idf = ln((1 + n) / (1 + df)) + 1
//   7. L2-normalise each row
//
// The vocabulary is learned once from the full corpus. Row entries
// are accumulated in column order, so a given corpus always yields
// the same matrix bit for bit.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::ml::sparse::CsrMatrix;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

/// Common English function words removed before n-gram generation.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself",
    "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "shall", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "upon", "us", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "yet", "you", "your", "yours", "yourself", "yourselves",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfConfig {
    /// Smallest and largest n-gram length, inclusive
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    /// Keep only the most frequent terms (by corpus count)
    pub max_features: Option<usize>,
    pub remove_stop_words: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.95,
            max_features: None,
            remove_stop_words: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig) -> Self {
        Self {
            config,
            vocabulary: Vec::new(),
            index: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Terms in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    fn tokens<'a>(&self, text: &'a str) -> Vec<&'a str> {
        TOKEN
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|t| !(self.config.remove_stop_words && ENGLISH_STOP_WORDS.contains(t)))
            .collect()
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let tokens = self.tokens(text);
        let (lo, hi) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in lo.max(1)..=hi {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    fn validate(&self, n_docs: usize) -> AnalysisResult<()> {
        let (lo, hi) = self.config.ngram_range;
        if lo == 0 || lo > hi {
            return Err(AnalysisError::invalid_config(format!(
                "invalid n-gram range ({lo}, {hi})"
            )));
        }
        if !(self.config.max_df > 0.0 && self.config.max_df <= 1.0) {
            return Err(AnalysisError::invalid_config(format!(
                "max_df must be in (0, 1], got {}",
                self.config.max_df
            )));
        }
        if n_docs == 0 {
            return Err(AnalysisError::EmptyInput("no documents to vectorize".into()));
        }
        Ok(())
    }

    /// Learn the vocabulary and idf weights, then return the TF-IDF matrix.
    pub fn fit_transform<S: AsRef<str>>(&mut self, docs: &[S]) -> AnalysisResult<CsrMatrix> {
        self.validate(docs.len())?;
        let n_docs = docs.len();

        let doc_terms: Vec<Vec<String>> = docs.iter().map(|d| self.terms(d.as_ref())).collect();

        // document frequency and total count per term
        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        let mut corpus_count: HashMap<&str, usize> = HashMap::new();
        for terms in &doc_terms {
            let mut seen: Vec<&str> = terms.iter().map(String::as_str).collect();
            for &t in &seen {
                *corpus_count.entry(t).or_insert(0) += 1;
            }
            seen.sort_unstable();
            seen.dedup();
            for t in seen {
                *df.entry(t).or_insert(0) += 1;
            }
        }

        let max_docs = self.config.max_df * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = df
            .into_iter()
            .filter(|&(_, d)| d >= self.config.min_df && d as f64 <= max_docs)
            .collect();

        if let Some(limit) = self.config.max_features {
            if kept.len() > limit {
                // most frequent first, alphabetical among equals
                kept.sort_by(|a, b| corpus_count[b.0].cmp(&corpus_count[a.0]).then(a.0.cmp(b.0)));
                kept.truncate(limit);
                kept.sort_by(|a, b| a.0.cmp(b.0));
            }
        }

        if kept.is_empty() {
            return Err(AnalysisError::EmptyVocabulary);
        }

        self.vocabulary = kept.iter().map(|(t, _)| t.to_string()).collect();
        self.idf = kept
            .iter()
            .map(|&(_, d)| ((1.0 + n_docs as f64) / (1.0 + d as f64)).ln() + 1.0)
            .collect();
        self.index = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        tracing::info!(
            "TF-IDF vocabulary: {} terms from {} documents",
            self.vocabulary.len(),
            n_docs
        );

        Ok(self.weigh(&doc_terms))
    }

    fn weigh(&self, doc_terms: &[Vec<String>]) -> CsrMatrix {
        let rows = doc_terms
            .iter()
            .map(|terms| {
                // column order keeps the norm's summation order fixed
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for t in terms {
                    if let Some(&col) = self.index.get(t) {
                        *counts.entry(col).or_insert(0.0) += 1.0;
                    }
                }
                let mut row: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(col, tf)| (col, tf * self.idf[col]))
                    .collect();
                let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, v) in &mut row {
                        *v /= norm;
                    }
                }
                row
            })
            .collect();
        CsrMatrix::from_rows(self.vocabulary.len(), rows)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "fishing quotas for the fishing fleet",
            "fishing fleet and coastal communities",
            "hospital waiting lists",
            "hospital waiting times and nurses",
        ]
    }

    fn loose() -> TfidfConfig {
        TfidfConfig {
            min_df: 1,
            max_df: 1.0,
            ..TfidfConfig::default()
        }
    }

    #[test]
    fn test_vocabulary_has_unigrams_and_bigrams_sorted() {
        let mut v = TfidfVectorizer::new(loose());
        let m = v.fit_transform(&corpus()).unwrap();

        assert_eq!(m.n_rows(), 4);
        assert_eq!(m.n_cols(), v.vocabulary().len());
        assert!(v.vocabulary().contains(&"fishing fleet".to_string()));
        assert!(v.vocabulary().contains(&"waiting lists".to_string()));
        // stop words never reach the vocabulary
        assert!(!v.vocabulary().iter().any(|t| t == "the" || t == "and"));
        let mut sorted = v.vocabulary().to_vec();
        sorted.sort();
        assert_eq!(sorted, v.vocabulary());
    }

    #[test]
    fn test_rows_are_unit_length() {
        let mut v = TfidfVectorizer::new(loose());
        let m = v.fit_transform(&corpus()).unwrap();
        for i in 0..m.n_rows() {
            assert!((m.row_sq_norm(i) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_document_frequency_filter() {
        let mut v = TfidfVectorizer::new(TfidfConfig {
            min_df: 2,
            max_df: 1.0,
            ..TfidfConfig::default()
        });
        v.fit_transform(&corpus()).unwrap();
        // only terms shared by at least two documents survive
        assert_eq!(
            v.vocabulary(),
            &["fishing", "fishing fleet", "fleet", "hospital", "hospital waiting", "waiting"]
        );
    }

    #[test]
    fn test_max_df_drops_ubiquitous_terms() {
        let docs = ["budget debate today", "budget vote tomorrow", "budget amendment"];
        let mut v = TfidfVectorizer::new(TfidfConfig {
            min_df: 1,
            max_df: 0.5,
            ..TfidfConfig::default()
        });
        v.fit_transform(&docs).unwrap();
        assert!(!v.vocabulary().contains(&"budget".to_string()));
    }

    #[test]
    fn test_idf_is_smoothed() {
        let mut v = TfidfVectorizer::new(loose());
        v.fit_transform(&corpus()).unwrap();
        let col = v.vocabulary().iter().position(|t| t == "hospital").unwrap();
        let expected = (5.0f64 / 3.0).ln() + 1.0;
        assert!((v.idf()[col] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        let mut v = TfidfVectorizer::new(TfidfConfig {
            min_df: 5,
            ..TfidfConfig::default()
        });
        assert!(matches!(
            v.fit_transform(&corpus()),
            Err(AnalysisError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_empty_corpus_is_an_error() {
        let mut v = TfidfVectorizer::new(loose());
        let empty: Vec<String> = Vec::new();
        assert!(matches!(v.fit_transform(&empty), Err(AnalysisError::EmptyInput(_))));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = TfidfVectorizer::new(TfidfConfig {
            max_features: Some(2),
            ..loose()
        });
        v.fit_transform(&corpus()).unwrap();
        // "fishing" occurs three times; the two-count tie breaks alphabetically
        assert_eq!(v.vocabulary(), &["fishing", "fishing fleet"]);
    }

    #[test]
    fn test_separate_vectorizers_agree_bit_for_bit() {
        // long documents with many distinct bigrams per row
        let docs: Vec<String> = (0..12)
            .map(|d| {
                (0..40)
                    .map(|w| format!("word{} term{}", (d * 7 + w) % 23, (d + w * 3) % 17))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        let first = TfidfVectorizer::new(loose()).fit_transform(&docs).unwrap();
        for _ in 0..20 {
            let again = TfidfVectorizer::new(loose()).fit_transform(&docs).unwrap();
            assert_eq!(again, first);
        }
    }
}
