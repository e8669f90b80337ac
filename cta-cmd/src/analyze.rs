//! Batch analysis and performance comparison commands.

use anyhow::Context;
use cta_data::{analyze_dataset, AnalysisConfig, BatchOutcome, BoundsTable, ExecutionMode, PerformanceReport};
use cta_model::{AnomalyError, Observation};
use log::info;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Everything `run_analyze` needs, gathered from the command line.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub bounds_json: Option<PathBuf>,
    pub mode: ExecutionMode,
    pub workers: Option<usize>,
    pub config: AnalysisConfig,
    pub timeout_secs: Option<u64>,
}

/// Run a blocking analysis off the async runtime, optionally under a deadline.
///
/// When the deadline passes the task is abandoned: whatever it eventually
/// produces is dropped, never returned.
pub async fn run_blocking<T, F>(timeout_secs: Option<u64>, work: F) -> anyhow::Result<T>
where
    F: FnOnce() -> cta_model::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    let joined = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), handle)
            .await
            .map_err(|_| AnomalyError::Execution(format!("analysis exceeded deadline of {secs}s")))?,
        None => handle.await,
    };
    let result = joined.map_err(|e| AnomalyError::Execution(format!("analysis task failed: {e}")))?;
    Ok(result?)
}

/// Load observations from a CSV file, adding the path to any error.
pub fn load_observations(input: &Path) -> anyhow::Result<Vec<Observation>> {
    Observation::read_csv_path(input)
        .with_context(|| format!("Failed to load observations from {}", input.display()))
}

/// Analyze the input CSV and write the requested outputs.
pub async fn run_analyze(request: AnalyzeRequest) -> anyhow::Result<BatchOutcome> {
    let observations = load_observations(&request.input)?;
    let mode = request.mode;
    let workers = request.workers;
    let config = request.config;

    let outcome = run_blocking(request.timeout_secs, move || {
        analyze_dataset(&observations, mode, workers, &config)
    })
    .await?;

    if !outcome.skipped.is_empty() {
        info!(
            "{} cities skipped ({} rows)",
            outcome.skipped.len(),
            outcome.skipped_rows()
        );
    }

    if let Some(output) = &request.output {
        outcome
            .dataset
            .write_csv_path(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    if let Some(bounds_path) = &request.bounds_json {
        let table = BoundsTable::from_dataset(&outcome.dataset);
        std::fs::write(bounds_path, table.to_json()?)
            .with_context(|| format!("Failed to write {}", bounds_path.display()))?;
        info!("Wrote {} season bounds to {}", table.len(), bounds_path.display());
    }

    info!(
        "{} anomalies in {} observations across {} cities",
        outcome.dataset.anomaly_count(),
        outcome.dataset.len(),
        outcome.dataset.cities().len()
    );
    Ok(outcome)
}

/// Time both execution modes on the input CSV and print the report.
pub async fn run_compare(
    input: &Path,
    workers: Option<usize>,
    config: AnalysisConfig,
) -> anyhow::Result<PerformanceReport> {
    let observations = load_observations(input)?;
    let report = run_blocking(None, move || cta_data::compare(&observations, workers, &config)).await?;

    println!("{report}");
    info!(
        "Compared {} rows: speedup {:.2}x, outputs identical: {}",
        report.rows,
        report.speedup(),
        report.identical
    );
    Ok(report)
}
