// src/main.rs
use std::path::PathBuf;

use clap::Parser;

use financing_extractor::acquire;
use financing_extractor::config::ExtractionConfig;
use financing_extractor::orchestrator::{DocumentOutcome, ExtractionOrchestrator};
use financing_extractor::report;
use financing_extractor::storage::{ResultStore, StorageManager};
use financing_extractor::summary::BatchSummary;
use financing_extractor::utils::{self, AppError};

const DEFAULT_INDEX_URL: &str =
    "https://www.treasurer.ca.gov/ctcac/2025/thirdround/4percent/application/index.asp";

/// Command Line Interface for the financing-cost extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Applications index page to download workbooks from
    #[arg(long, default_value = DEFAULT_INDEX_URL)]
    url: String,

    /// Local directory holding the application workbooks
    #[arg(short, long, default_value = "applications")]
    store_dir: PathBuf,

    /// Path of the summary workbook to write
    #[arg(short, long, default_value = "financing_costs_summary.xlsx")]
    output: PathBuf,

    /// Also write one JSON result per application into this directory
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Use the workbooks already in the store instead of downloading
    #[arg(long, visible_alias = "no-download")]
    skip_download: bool,

    /// Maximum number of workbooks to download
    #[arg(long)]
    limit: Option<usize>,

    /// Allowed gap between a section total and the sum of its line items
    /// (default: $FINANCING_TOTAL_TOLERANCE or 0.01)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Rows below a section header searched for its line items
    #[arg(long)]
    section_window: Option<usize>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args);

    let config = ExtractionConfig::resolve(args.tolerance, args.section_window).map_err(AppError::Config)?;

    // 3. Initialize storage
    let store = StorageManager::new(&args.store_dir)?;

    // 4. Download workbooks, falling back to whatever is already in the store
    let mut workbooks = Vec::new();
    if !args.skip_download {
        tracing::info!("Step 1: Downloading Excel files...");
        match acquire::download_workbooks(&args.url, &store, args.limit).await {
            Ok(paths) => workbooks = paths,
            Err(e) => tracing::error!("Error accessing URL: {}", e),
        }
    }
    if workbooks.is_empty() {
        tracing::info!("Checking for existing Excel files in '{}'", store.base_dir().display());
        workbooks = store.list_workbooks().await?;
    }
    if workbooks.is_empty() {
        tracing::warn!(
            "No Excel files found. Run without --skip-download, or place workbooks in '{}'.",
            store.base_dir().display()
        );
        return Ok(());
    }

    // 5. Extract every workbook
    tracing::info!("Step 2: Parsing {} applications...", workbooks.len());
    let orchestrator = ExtractionOrchestrator::new(config);
    let outcomes = orchestrator.run_batch(workbooks).await;

    // 6. Persist and report
    let summary = BatchSummary::from_outcomes(&outcomes);
    if let Some(dir) = &args.results_dir {
        let results = ResultStore::new(dir)?;
        for outcome in &outcomes {
            if let DocumentOutcome::Extracted(result) = outcome {
                if let Err(e) = results.save_result(result) {
                    tracing::error!("Failed to save result for {}: {}", result.source_identifier, e);
                }
            }
        }
        results.save_batch_metadata(&summary)?;
    }

    tracing::info!("Step 3: Generating summary report...");
    report::write_summary_report(&outcomes, &args.output)?;

    summary.log();

    if summary.total_parsed == 0 && summary.failed > 0 {
        return Err(AppError::Processing(format!(
            "Failed to read any of {} workbooks",
            summary.failed
        )));
    }

    Ok(())
}
