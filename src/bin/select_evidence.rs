use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use evidence_core::cache::FileBacking;
use evidence_core::cli::RunOptions;
use evidence_core::control::DirectoryControls;
use evidence_core::document::DirectoryCorpus;
use evidence_core::oracle::{HttpOracle, OracleConfig};
use evidence_core::report::ReportEmitter;
use evidence_core::telemetry;
use evidence_core::types::ControlId;
use evidence_core::ControlRun;

#[derive(Parser)]
#[command(name = "select-evidence")]
#[command(about = "Select relevant documents for an ISO 27001 control", long_about = None)]
#[command(version)]
struct Cli {
    /// ISO 27001 control ID (e.g. 5.1, 8.3, 8.15)
    control_id: String,

    /// Directory containing control files named "<id> <title>.md"
    #[arg(long, default_value = "controls")]
    controls_dir: PathBuf,

    /// Directory the report is written to
    #[arg(long, default_value = "selected_documents")]
    output_dir: PathBuf,

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
    let control_id = ControlId::parse(&cli.control_id)?;
    let config = cli.options.load_config().context("Failed to load configuration")?;

    let oracle_config = OracleConfig::from_env();
    info!(model = %oracle_config.model, base_url = %oracle_config.base_url, "Oracle configured");
    let oracle = Arc::new(HttpOracle::new(oracle_config).context("Failed to create oracle client")?);

    let run = ControlRun::new(
        DirectoryControls::new(&cli.controls_dir),
        DirectoryCorpus::new(&cli.options.documents_dir),
        FileBacking::new(&cli.options.cache_dir),
        oracle.clone(),
        ReportEmitter::new(&cli.output_dir),
        config,
    );

    let result = run.run(&control_id).await;

    let usage = oracle.usage();
    info!(
        requests = usage.requests,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens(),
        "Oracle usage"
    );
    if let Some(cost) = oracle.estimated_cost() {
        info!(
            prompt_usd = cost.prompt,
            completion_usd = cost.completion,
            total_usd = cost.total(),
            "Estimated oracle cost"
        );
    }

    match result {
        Ok(outcome) => {
            info!(
                control = %outcome.control.display_name(),
                selected = outcome.selection.len(),
                path = %outcome.report_path.display(),
                "Output saved"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(control = %control_id, error = %err, "Evidence selection failed");
            eprintln!("Error: {err}");
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}
