// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `topics`, `endgame` and `all`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{endgame_use_case::EndgameConfig, topics_use_case::TopicsConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster debate transcripts into topics
    Topics(TopicsArgs),

    /// Classify KRK endgame outcomes with gradient boosting
    Endgame(EndgameArgs),

    /// Run both pipelines with their default settings
    All(AllArgs),
}

/// All arguments for the `topics` command.
#[derive(Args, Debug, Clone)]
pub struct TopicsArgs {
    /// CSV file with a `talk_text` column
    #[arg(long, default_value = "data/debates_2022.csv")]
    pub debates: String,

    /// Drop terms found in fewer documents than this
    #[arg(long, default_value_t = 2)]
    pub min_df: usize,

    /// Drop terms found in more than this fraction of documents
    #[arg(long, default_value_t = 0.95)]
    pub max_df: f64,

    /// Keep only the N most frequent terms
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Smallest number of clusters to try
    #[arg(long, default_value_t = 2)]
    pub k_min: usize,

    /// Upper bound (exclusive) on the number of clusters to try
    #[arg(long, default_value_t = 13)]
    pub k_max: usize,

    /// K-means restarts per fit
    #[arg(long, default_value_t = 10)]
    pub n_init: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Rows used to compute each silhouette score
    #[arg(long, default_value_t = 5000)]
    pub silhouette_sample: usize,

    /// Seed for the silhouette row sample
    #[arg(long, default_value_t = 42)]
    pub silhouette_seed: u64,

    /// Terms listed per cluster
    #[arg(long, default_value_t = 10)]
    pub top_terms: usize,

    /// Keep English stop words in the vocabulary
    #[arg(long)]
    pub keep_stop_words: bool,

    /// Write projection.csv (pc1,pc2,cluster per document, for plotting elsewhere; no plot is rendered) and topics_report.json here
    #[arg(long)]
    pub output_dir: Option<String>,
}

/// Convert CLI TopicsArgs into the application-layer TopicsConfig.
/// The application layer never sees clap types.
impl From<TopicsArgs> for TopicsConfig {
    fn from(a: TopicsArgs) -> Self {
        TopicsConfig {
            debates_path:      a.debates,
            min_df:            a.min_df,
            max_df:            a.max_df,
            max_features:      a.max_features,
            keep_stop_words:   a.keep_stop_words,
            k_min:             a.k_min,
            k_max:             a.k_max,
            n_init:            a.n_init,
            seed:              a.seed,
            silhouette_sample: a.silhouette_sample,
            silhouette_seed:   a.silhouette_seed,
            top_terms:         a.top_terms,
            output_dir:        a.output_dir,
        }
    }
}

/// All arguments for the `endgame` command.
#[derive(Args, Debug, Clone)]
pub struct EndgameArgs {
    /// CSV file with the six position columns and `white_depth_of_win`
    #[arg(long, default_value = "data/king_rook_vs_king.csv")]
    pub positions: String,

    /// Cross-validation folds
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Fraction of positions held out for the final report
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the hold-out split and the booster
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Boosting stages
    #[arg(long, default_value_t = 100)]
    pub n_estimators: usize,

    /// Shrinkage applied to every tree
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    /// Depth of each regression tree
    #[arg(long, default_value_t = 3)]
    pub max_depth: usize,

    /// Fraction of rows drawn for each stage
    #[arg(long, default_value_t = 1.0)]
    pub subsample: f64,

    /// Write endgame_report.json here
    #[arg(long)]
    pub output_dir: Option<String>,
}

impl From<EndgameArgs> for EndgameConfig {
    fn from(a: EndgameArgs) -> Self {
        EndgameConfig {
            positions_path: a.positions,
            folds:          a.folds,
            test_fraction:  a.test_fraction,
            seed:           a.seed,
            n_estimators:   a.n_estimators,
            learning_rate:  a.learning_rate,
            max_depth:      a.max_depth,
            subsample:      a.subsample,
            output_dir:     a.output_dir,
        }
    }
}

/// All arguments for the `all` command.
#[derive(Args, Debug, Clone)]
pub struct AllArgs {
    #[arg(long, default_value = "data/debates_2022.csv")]
    pub debates: String,

    #[arg(long, default_value = "data/king_rook_vs_king.csv")]
    pub positions: String,

    /// Write both reports and projection.csv here (no plot is rendered)
    #[arg(long)]
    pub output_dir: Option<String>,
}

impl AllArgs {
    pub fn topics_config(&self) -> TopicsConfig {
        TopicsConfig {
            debates_path: self.debates.clone(),
            output_dir: self.output_dir.clone(),
            ..TopicsConfig::default()
        }
    }

    pub fn endgame_config(&self) -> EndgameConfig {
        EndgameConfig {
            positions_path: self.positions.clone(),
            output_dir: self.output_dir.clone(),
            ..EndgameConfig::default()
        }
    }
}
