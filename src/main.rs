//! CLI entry point: load a graph payload (and optional signal table) from
//! JSON, run the recommendation engine for one user, print the response.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;

use friendgraph::config::EngineConfig;
use friendgraph::engine::recommend::{GraphSource, RecommendationEngine, StaticSignals};
use friendgraph::error::Result;
use friendgraph::observability::init_logging;
use friendgraph::types::{CandidateSignals, FeatureSimilarity, GraphInput, NodeId};

/// Friend recommendations from a social graph snapshot.
#[derive(Debug, Parser)]
#[command(name = "friendgraph", version, about)]
struct Cli {
    /// Path to the graph payload JSON ({ nodes: [...], edges: [...] }).
    #[arg(long)]
    graph: PathBuf,

    /// Source user id to recommend connections for.
    #[arg(long)]
    user: NodeId,

    /// Number of recommendations to return (config default: 5).
    #[arg(long)]
    top_k: Option<usize>,

    /// Optional engine config YAML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optional JSON table of externally computed signals.
    #[arg(long)]
    signals: Option<PathBuf>,
}

/// One row of the external signal table JSON.
#[derive(Debug, Deserialize)]
struct SignalEntry {
    user: NodeId,
    candidate: NodeId,
    #[serde(default)]
    interest_similarity: f64,
    #[serde(default)]
    education_similarity: f64,
    #[serde(default)]
    work_similarity: f64,
    #[serde(default)]
    interaction_weight: Option<f64>,
}

struct FileGraphSource {
    path: PathBuf,
}

impl GraphSource for FileGraphSource {
    fn load(&self) -> Result<GraphInput> {
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn load_signals(path: &Path) -> Result<StaticSignals> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<SignalEntry> = serde_json::from_str(&raw)?;

    let mut signals = StaticSignals::new();
    for entry in entries {
        signals.insert(
            entry.user,
            entry.candidate,
            CandidateSignals {
                features: Some(FeatureSimilarity {
                    interest: entry.interest_similarity,
                    education: entry.education_similarity,
                    work: entry.work_similarity,
                }),
                interaction_weight: entry.interaction_weight,
            },
        );
    }
    Ok(signals)
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::default(),
    };

    let signals = match &cli.signals {
        Some(path) => load_signals(path)?,
        None => StaticSignals::new(),
    };

    let engine = RecommendationEngine::new(FileGraphSource { path: cli.graph.clone() }, signals, config);
    let response = engine.recommend(cli.user, cli.top_k)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
