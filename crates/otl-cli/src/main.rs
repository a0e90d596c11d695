//! OTL CLI - Command-line interface
//!
//! Usage:
//!   otl resolve <edges.json> [--gold <gold.json>] [--json]
//!   otl extract <candidates.json> --index <index.json> --ontology <ontology.json>

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use otl_core::{AppConfig, LoggingConfig};
use otl_extractor::{
    engine_from_records, resolve_concurrently, CandidatePair, Evaluator, ExtractedRelation,
    GoldRelation, HypothesisRecord, InMemoryPatternIndex, Ontology, RelationMetrics,
    ResolvingExtractor,
};

#[derive(Parser)]
#[command(name = "otl")]
#[command(about = "Type-consistent relation resolution")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a list of precomputed hypotheses
    Resolve {
        /// JSON array of hypothesis records
        input: PathBuf,
        /// Gold relations to evaluate against
        #[arg(long)]
        gold: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Expand candidate pairs through a pattern index, then resolve
    Extract {
        /// JSON array of candidate pairs
        input: PathBuf,
        /// Pattern index JSON
        #[arg(long)]
        index: PathBuf,
        /// Relation signatures JSON
        #[arg(long)]
        ontology: PathBuf,
        /// Gold relations to evaluate against
        #[arg(long)]
        gold: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    relations: &'a [ExtractedRelation],
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<RelationMetrics>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Resolve { input, gold, json } => {
            let records: Vec<HypothesisRecord> = read_json(&input)?;
            tracing::info!(hypotheses = records.len(), "resolving");

            let engine = engine_from_records(records, config.resolver.clone());
            let relations = resolve_concurrently(&engine).await?;
            emit(&relations, gold.as_deref(), json)?;
        }
        Commands::Extract {
            input,
            index,
            ontology,
            gold,
            json,
        } => {
            let candidates: Vec<CandidatePair> = read_json(&input)?;
            let index = InMemoryPatternIndex::from_file(&index)
                .with_context(|| format!("loading pattern index {}", index.display()))?;
            let ontology = Ontology::from_file(&ontology)
                .with_context(|| format!("loading ontology {}", ontology.display()))?;

            let extractor = ResolvingExtractor::new(index, ontology).with_config(&config);
            let (engine, stats) = extractor.build_engine(&candidates).await?;
            tracing::info!(
                candidates = stats.candidates,
                matched = stats.matched,
                unmatched = stats.unmatched,
                unknown_relations = stats.unknown_relations,
                hypotheses = stats.hypotheses,
                rejected = stats.rejected,
                "expanded candidates"
            );

            let relations = resolve_concurrently(&engine).await?;
            emit(&relations, gold.as_deref(), json)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn emit(relations: &[ExtractedRelation], gold: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let metrics = match gold {
        Some(path) => {
            let gold = GoldRelation::load(path)
                .with_context(|| format!("loading gold relations {}", path.display()))?;
            Some(Evaluator::new().evaluate_relations(relations, &gold))
        }
        None => None,
    };

    if json {
        let report = Report { relations, metrics };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:<24} {:<20} {:<24} {:>6}  TYPES",
        "SUBJECT", "RELATION", "OBJECT", "SCORE"
    );
    for r in relations {
        println!(
            "{:<24} {:<20} {:<24} {:>6.3}  {} -> {}",
            r.subject.text, r.predicate, r.object.text, r.confidence, r.domain_type, r.range_type
        );
    }
    println!("\n{} relation(s)", relations.len());

    if let Some(metrics) = metrics {
        println!("\n{}", metrics.report());
    }
    Ok(())
}
