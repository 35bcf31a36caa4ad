use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use citemend_biblio::{
    BibliographyAnalyzer, EnrichConfig, ErrorReport, GroqExtractor, RawReference,
    ReferencePipeline,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "citemend",
    about = "Enrich the bibliography of an academic document with verified identifiers",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print the JSON report.
    #[arg(long, global = true)]
    pretty: bool,

    /// Override the pause between reference enrichments, in milliseconds.
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Development mode: include diagnostic detail in error reports.
    #[arg(long, global = true)]
    dev: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document's text: extract the bibliography with the LLM and
    /// enrich every reference. Requires GROQ_API_KEY.
    Analyze {
        /// Text file with the document (or bibliography) contents.
        file: PathBuf,
    },

    /// Enrich pre-extracted references from a JSON array, skipping the LLM.
    Enrich {
        /// JSON file with an array of raw reference records.
        file: PathBuf,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EnrichConfig::load()?;
    if let Some(delay_ms) = cli.delay_ms {
        config.inter_reference_delay_ms = delay_ms;
    }
    if cli.dev {
        config.development = true;
    }

    match cli.command {
        Commands::Analyze { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let extractor = GroqExtractor::from_config(&config)?;
            let analyzer = BibliographyAnalyzer::new(
                Arc::new(extractor),
                ReferencePipeline::from_config(&config),
            );

            match analyzer.analyze(&text).await {
                Ok(report) => print_report(&report, cli.pretty)?,
                Err(err) => {
                    print_report(&ErrorReport::from_error(&err, config.development), cli.pretty)?;
                    std::process::exit(1);
                }
            }
        }

        Commands::Enrich { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let references: Vec<RawReference> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of references", file.display()))?;

            let analyzer = BibliographyAnalyzer::new(
                Arc::new(NoExtraction),
                ReferencePipeline::from_config(&config),
            );
            let report = analyzer.enrich(references).await;
            print_report(&report, cli.pretty)?;
        }
    }

    Ok(())
}

/// Placeholder extractor for the `enrich` command, which never reaches the
/// extraction stage.
struct NoExtraction;

#[async_trait::async_trait]
impl citemend_biblio::ReferenceExtraction for NoExtraction {
    async fn extract_references(
        &self,
        _bibliography: &str,
    ) -> citemend_biblio::Result<Vec<RawReference>> {
        Ok(Vec::new())
    }
}

fn print_report<T: serde::Serialize>(report: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{rendered}");
    Ok(())
}
