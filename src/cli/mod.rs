// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All analysis is delegated to Layer 2 (application); this
// layer only routes and prints.
//
// Three commands are supported:
//   1. `topics`  — TF-IDF + K-means topic clustering of debates
//   2. `endgame` — gradient-boosted KRK outcome classifier
//   3. `all`     — both, one after the other
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EndgameArgs, TopicsArgs};

use crate::application::{
    endgame_use_case::{bucket_name, EndgameConfig, EndgameReport, EndgameUseCase},
    topics_use_case::{TopicsConfig, TopicsReport, TopicsUseCase},
};

#[derive(Parser, Debug)]
#[command(
    name = "debate-endgame-analysis",
    version = "0.1.0",
    about = "Topic clustering of debate transcripts and KRK endgame outcome classification."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Topics(args) => run_topics(args.into()),
            Commands::Endgame(args) => run_endgame(args.into()),
            Commands::All(args) => {
                run_topics(args.topics_config())?;
                run_endgame(args.endgame_config())
            }
        }
    }
}

fn run_topics(config: TopicsConfig) -> Result<()> {
    tracing::info!("Starting topic clustering on '{}'", config.debates_path);
    let outcome = TopicsUseCase::new(config).execute()?;
    print!("{}", render_topics(&outcome.report));
    Ok(())
}

fn run_endgame(config: EndgameConfig) -> Result<()> {
    tracing::info!("Starting endgame classification on '{}'", config.positions_path);
    let report = EndgameUseCase::new(config).execute()?;
    print!("{}", render_endgame(&report));
    Ok(())
}

fn render_topics(report: &TopicsReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nBest k: {} (silhouette score {:.4})\n",
        report.best_k, report.best_score
    ));
    out.push_str(&format!(
        "{} documents, {} terms\n\n",
        report.n_documents, report.n_terms
    ));
    for cluster in &report.clusters {
        out.push_str(&format!(
            "Cluster {} ({} documents): {}\n",
            cluster.cluster,
            cluster.size,
            cluster.terms.join(", ")
        ));
    }
    if let [pc1, pc2, ..] = report.explained_variance_ratio[..] {
        out.push_str(&format!(
            "\nPCA explained variance: PC1 {:.2}%, PC2 {:.2}%\n",
            pc1 * 100.0,
            pc2 * 100.0
        ));
    }
    out
}

fn render_endgame(report: &EndgameReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{} positions\n", report.n_positions));
    out.push_str(&format!(
        "Cross-validation accuracy: {:.4} (+/- {:.4})\n",
        report.cv_mean, report.cv_std
    ));
    out.push_str(&format!(
        "\nHold-out evaluation ({} train / {} test)\n\n",
        report.train_size, report.test_size
    ));
    out.push_str(&report.report.render(bucket_name));
    out.push_str("\nConfusion matrix (rows = true, columns = predicted)\n");
    out.push_str(&report.confusion.render(bucket_name));
    out
}
