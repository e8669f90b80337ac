//! Fan-out/fan-in orchestration of per-city analysis.
//!
//! The dataset is split into one partition per city. Partitions share no
//! mutable state, so they can be analyzed in any order or concurrently; the
//! merged result is always re-sorted by (city, timestamp).

use crate::{city::analyze_city, config::AnalysisConfig};
use cta_model::{AnalyzedDataset, AnalyzedObservation, AnomalyError, Observation, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    str::FromStr,
};

/// How partitions are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    /// One partition at a time on the calling thread
    Sequential,
    /// Partitions spread over a bounded worker pool
    #[default]
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Parallel => f.write_str("parallel"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "serial" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            other => Err(format!("unknown execution mode '{other}' (expected sequential or parallel)")),
        }
    }
}

/// A city whose analysis failed and was left out of the merged dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPartition {
    pub city: String,
    pub rows: usize,
    pub reason: String,
}

/// Result of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub dataset: AnalyzedDataset,
    /// Partitions excluded because their analysis failed, in city order
    pub skipped: Vec<SkippedPartition>,
}

impl BatchOutcome {
    /// Number of input rows missing from `dataset`.
    pub fn skipped_rows(&self) -> usize {
        self.skipped.iter().map(|s| s.rows).sum()
    }
}

/// Default pool size: one worker per available processing unit.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

type PartitionResult = std::result::Result<Vec<AnalyzedObservation>, SkippedPartition>;

/// Analyze a full dataset, one partition per city.
///
/// A partition whose analysis fails (or panics) is excluded from the dataset
/// and listed in [`BatchOutcome::skipped`]; the other partitions are not
/// affected. The dataset is only assembled once every partition has reported.
///
/// `worker_count` sizes the pool in parallel mode and defaults to
/// [`default_worker_count`]. It is ignored in sequential mode.
pub fn analyze_dataset(
    observations: &[Observation],
    mode: ExecutionMode,
    worker_count: Option<usize>,
    config: &AnalysisConfig,
) -> Result<BatchOutcome> {
    config.validate()?;
    let partitions: Vec<(String, Vec<Observation>)> =
        Observation::partition_by_city(observations).into_iter().collect();
    info!(
        "Analyzing {} observations across {} cities ({} mode)",
        observations.len(),
        partitions.len(),
        mode
    );

    let results: Vec<PartitionResult> = match mode {
        ExecutionMode::Sequential => partitions
            .into_iter()
            .map(|(city, partition)| run_partition(city, partition, config))
            .collect(),
        ExecutionMode::Parallel => {
            let workers = worker_count.unwrap_or_else(default_worker_count);
            if workers == 0 {
                return Err(AnomalyError::Execution(
                    "worker pool needs at least one worker".to_string(),
                ));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("cta-worker-{i}"))
                .build()
                .map_err(|e| AnomalyError::Execution(format!("failed to build worker pool: {e}")))?;
            debug!("Dispatching {} partitions to {} workers", partitions.len(), workers);
            pool.install(|| {
                partitions
                    .into_par_iter()
                    .map(|(city, partition)| run_partition(city, partition, config))
                    .collect()
            })
        }
    };

    let outcome = merge_partitions(results);
    info!(
        "Analysis complete: {} rows, {} anomalies, {} rows skipped",
        outcome.dataset.len(),
        outcome.dataset.anomaly_count(),
        outcome.skipped_rows()
    );
    Ok(outcome)
}

/// Fan-in: keep every successful partition, log and record the failed ones.
fn merge_partitions(results: Vec<PartitionResult>) -> BatchOutcome {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(analyzed) => rows.extend(analyzed),
            Err(skip) => {
                warn!(
                    "Skipping city '{}' ({} rows): {}",
                    skip.city, skip.rows, skip.reason
                );
                skipped.push(skip);
            }
        }
    }
    BatchOutcome {
        dataset: AnalyzedDataset::from_rows(rows),
        skipped,
    }
}

fn run_partition(city: String, partition: Vec<Observation>, config: &AnalysisConfig) -> PartitionResult {
    run_partition_with(city, partition, |partition| analyze_city(partition, config))
}

fn run_partition_with<F>(city: String, partition: Vec<Observation>, analyze: F) -> PartitionResult
where
    F: FnOnce(Vec<Observation>) -> Result<Vec<AnalyzedObservation>>,
{
    let rows = partition.len();
    match catch_unwind(AssertUnwindSafe(|| analyze(partition))) {
        Ok(Ok(analyzed)) => Ok(analyzed),
        Ok(Err(e)) => Err(SkippedPartition {
            city,
            rows,
            reason: e.to_string(),
        }),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string());
            Err(SkippedPartition {
                city,
                rows,
                reason: format!("analysis panicked: {reason}"),
            })
        }
    }
}
