//! Warm the keyword signature cache for every document in the corpus.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use evidence_core::batch::Progress;
use evidence_core::cache::{FileBacking, KeywordStore};
use evidence_core::cli::RunOptions;
use evidence_core::document::{DirectoryCorpus, DocumentCorpus};
use evidence_core::oracle::{HttpOracle, OracleClient, OracleConfig};
use evidence_core::telemetry;

#[derive(Parser)]
#[command(name = "extract-keywords")]
#[command(about = "Extract and cache keyword signatures for all documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: RunOptions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.options.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.options.load_config().context("Failed to load configuration")?;
    let documents = DirectoryCorpus::new(&cli.options.documents_dir)
        .documents()
        .context("Failed to read documents")?;

    let oracle = Arc::new(HttpOracle::new(OracleConfig::from_env()).context("Failed to create oracle client")?);
    let store = KeywordStore::new(
        FileBacking::new(&cli.options.cache_dir),
        OracleClient::new(oracle.clone(), config.retry.clone()),
    )
    .with_max_keywords(config.max_keywords)
    .with_concurrency(config.concurrency);

    let progress = Progress::new(documents.len());
    let outcome = match tokio::time::timeout(
        config.run_timeout(),
        store.get_signatures_tracked(&documents, &progress),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(
                completed = progress.completed(),
                total = progress.total(),
                "Timed out; completed signatures are cached"
            );
            return Ok(ExitCode::from(4));
        }
    };

    let usage = oracle.usage();
    info!(
        documents = documents.len(),
        signatures = outcome.succeeded.len(),
        failures = outcome.failed.len(),
        total_tokens = usage.total_tokens(),
        "Keyword extraction complete"
    );
    if let Some(cost) = oracle.estimated_cost() {
        info!(total_usd = cost.total(), "Estimated oracle cost");
    }

    let total_outage = outcome.succeeded.is_empty()
        && !outcome.failed.is_empty()
        && outcome.failed.iter().all(|f| f.source.is_unavailable());
    if total_outage {
        error!("Oracle unavailable for every document");
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}
