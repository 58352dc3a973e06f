// ============================================================
// Layer 2 — TopicsUseCase
// ============================================================
// Orchestrates the topic clustering pipeline in order:
//
//   Step 1: Load debate transcripts     (Layer 4 - data)
//   Step 2: Clean the text              (Layer 4 - data)
//   Step 3: TF-IDF vectorize            (Layer 5 - ml)
//   Step 4: Choose k by silhouette      (Layer 5 - ml)
//   Step 5: Final K-means + top terms   (Layer 5 - ml)
//   Step 6: 2-D PCA projection          (Layer 5 - ml)
//   Step 7: Export (only with --output-dir) (Layer 6 - infra)
//
// Records are annotated in place with `clean_text` (step 2) and
// `cluster` (step 5) and handed back to the caller with the
// report; nothing is written back to the source CSV.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{loader::DebateCsvLoader, preprocessor::Preprocessor};
use crate::domain::{debate::DebateRecord, error::AnalysisError, traits::RecordSource};
use crate::infra::{
    projection_writer::{projection_rows, ProjectionWriter},
    report_store::{ReportStore, TOPICS_REPORT_FILE},
};
use crate::ml::{
    clusterer::{ClusterTerms, Clusterer},
    k_selector::{KScore, KSelector, KSelectorConfig},
    kmeans::KMeansConfig,
    pca::{PcaConfig, Projection, Projector},
    tfidf::{TfidfConfig, TfidfVectorizer},
};

// ─── Topics Configuration ────────────────────────────────────────────────────
// Every knob of the topic pipeline. Serialisable so it can be
// written next to the report it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    pub debates_path:      String,
    pub min_df:            usize,
    pub max_df:            f64,
    pub max_features:      Option<usize>,
    pub keep_stop_words:   bool,
    pub k_min:             usize,
    pub k_max:             usize,
    pub n_init:            usize,
    pub seed:              u64,
    pub silhouette_sample: usize,
    pub silhouette_seed:   u64,
    pub top_terms:         usize,
    pub output_dir:        Option<String>,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            debates_path:      "data/debates_2022.csv".to_string(),
            min_df:            2,
            max_df:            0.95,
            max_features:      None,
            keep_stop_words:   false,
            k_min:             2,
            k_max:             13,
            n_init:            10,
            seed:              42,
            silhouette_sample: 5000,
            silhouette_seed:   42,
            top_terms:         10,
            output_dir:        None,
        }
    }
}

impl TopicsConfig {
    fn tfidf(&self) -> TfidfConfig {
        TfidfConfig {
            min_df: self.min_df,
            max_df: self.max_df,
            max_features: self.max_features,
            remove_stop_words: !self.keep_stop_words,
            ..TfidfConfig::default()
        }
    }

    fn kmeans(&self) -> KMeansConfig {
        KMeansConfig {
            n_init: self.n_init,
            seed: self.seed,
            ..KMeansConfig::default()
        }
    }

    fn k_selector(&self) -> KSelectorConfig {
        KSelectorConfig {
            k_range: self.k_min..self.k_max,
            kmeans: self.kmeans(),
            sample_size: self.silhouette_sample,
            sample_seed: self.silhouette_seed,
        }
    }
}

// ─── Topics Report ───────────────────────────────────────────────────────────
/// Everything the topic pipeline prints, in serialisable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicsReport {
    pub n_documents: usize,
    pub n_terms: usize,
    pub best_k: usize,
    pub best_score: f64,
    pub k_scores: Vec<KScore>,
    pub clusters: Vec<ClusterTerms>,
    pub inertia: f64,
    pub explained_variance_ratio: Vec<f64>,
}

/// Report plus the annotated records and their 2-D coordinates.
pub struct TopicsOutcome {
    pub report: TopicsReport,
    pub records: Vec<DebateRecord>,
    pub projection: Projection,
}

// ─── TopicsUseCase ───────────────────────────────────────────────────────────
pub struct TopicsUseCase {
    config: TopicsConfig,
}

impl TopicsUseCase {
    pub fn new(config: TopicsConfig) -> Self {
        Self { config }
    }

    /// Load the debates CSV and run the whole pipeline on it.
    pub fn execute(&self) -> Result<TopicsOutcome> {
        // ── Step 1: Load transcripts ─────────────────────────────────────────
        tracing::info!("Loading debates from '{}'", self.config.debates_path);
        let loader = DebateCsvLoader::new(&self.config.debates_path);
        let records = loader.load_all()?;

        let outcome = self.analyse(records)?;

        // ── Step 7: Optional export ──────────────────────────────────────────
        if let Some(dir) = &self.config.output_dir {
            self.export(dir, &outcome)?;
        }
        Ok(outcome)
    }

    /// Steps 2–6 on records that are already in memory.
    pub fn analyse(&self, mut records: Vec<DebateRecord>) -> Result<TopicsOutcome> {
        if records.is_empty() {
            return Err(AnalysisError::EmptyInput(
                "no debate records with text remain after loading".into(),
            )
            .into());
        }

        // ── Step 2: Normalise text ───────────────────────────────────────────
        let preprocessor = Preprocessor::new();
        for record in &mut records {
            record.clean_text = Some(preprocessor.clean(&record.talk_text));
        }
        tracing::info!("Cleaned {} transcripts", records.len());

        // ── Step 3: TF-IDF ───────────────────────────────────────────────────
        let mut vectorizer = TfidfVectorizer::new(self.config.tfidf());
        let texts: Vec<&str> = records.iter().map(DebateRecord::text_for_vectorizing).collect();
        let matrix = vectorizer
            .fit_transform(&texts)
            .context("TF-IDF vectorization failed")?;
        let vocabulary = vectorizer.vocabulary().to_vec();
        tracing::info!(
            "TF-IDF matrix: {} documents × {} terms ({} non-zeros)",
            matrix.n_rows(),
            matrix.n_cols(),
            matrix.nnz()
        );

        // ── Step 4: Choose the number of topics ──────────────────────────────
        let selection = KSelector::new(self.config.k_selector())
            .select(&matrix)
            .context("Choosing the number of clusters failed")?;

        // ── Step 5: Final clustering ─────────────────────────────────────────
        let clusterer = Clusterer::new(self.config.kmeans(), self.config.top_terms);
        let clustering = clusterer
            .fit(&matrix, &vocabulary, selection.best_k)
            .context("Final K-means fit failed")?;
        for (record, &label) in records.iter_mut().zip(&clustering.labels) {
            record.cluster = Some(label);
        }

        // ── Step 6: Project for plotting ─────────────────────────────────────
        let projection = Projector::new(PcaConfig {
            seed: self.config.seed,
            ..PcaConfig::default()
        })
        .project(&matrix)
        .context("PCA projection failed")?;

        let report = TopicsReport {
            n_documents: matrix.n_rows(),
            n_terms: matrix.n_cols(),
            best_k: selection.best_k,
            best_score: selection.best_score,
            k_scores: selection.scores,
            clusters: clustering.clusters,
            inertia: clustering.inertia,
            explained_variance_ratio: projection.explained_variance_ratio.clone(),
        };
        Ok(TopicsOutcome {
            report,
            records,
            projection,
        })
    }

    fn export(&self, dir: &str, outcome: &TopicsOutcome) -> Result<()> {
        let labels: Vec<usize> = outcome
            .records
            .iter()
            .map(|r| r.cluster.unwrap_or_default())
            .collect();
        let rows = projection_rows(&outcome.projection.coords, &labels)?;
        ProjectionWriter::new(dir)?.write(&rows)?;
        ReportStore::new(dir)?.save(TOPICS_REPORT_FILE, &outcome.report)?;
        Ok(())
    }
}
