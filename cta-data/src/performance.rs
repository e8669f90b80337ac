//! Wall-clock comparison of the two execution modes.

use crate::{
    batch::{analyze_dataset, ExecutionMode},
    config::AnalysisConfig,
};
use cta_model::{Observation, Result};
use std::{fmt, time::Duration, time::Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub sequential_elapsed: Duration,
    pub parallel_elapsed: Duration,
    /// Rows in each analyzed dataset
    pub rows: usize,
    /// Whether both modes produced bit-identical datasets
    pub identical: bool,
}

impl PerformanceReport {
    /// Sequential time divided by parallel time.
    pub fn speedup(&self) -> f64 {
        let parallel = self.parallel_elapsed.as_secs_f64();
        if parallel > 0.0 {
            self.sequential_elapsed.as_secs_f64() / parallel
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sequential execution time: {:.2} seconds",
            self.sequential_elapsed.as_secs_f64()
        )?;
        write!(
            f,
            "Parallel execution time: {:.2} seconds",
            self.parallel_elapsed.as_secs_f64()
        )
    }
}

/// Run the batch once sequentially and once in parallel over the same input
/// and time each run. An error in either run is returned as is.
pub fn compare(
    observations: &[Observation],
    worker_count: Option<usize>,
    config: &AnalysisConfig,
) -> Result<PerformanceReport> {
    let start = Instant::now();
    let sequential = analyze_dataset(observations, ExecutionMode::Sequential, None, config)?;
    let sequential_elapsed = start.elapsed();

    let start = Instant::now();
    let parallel = analyze_dataset(observations, ExecutionMode::Parallel, worker_count, config)?;
    let parallel_elapsed = start.elapsed();

    let identical = sequential.dataset.bitwise_eq(&parallel.dataset);
    if !identical {
        log::warn!("Sequential and parallel runs produced different datasets");
    }
    Ok(PerformanceReport {
        sequential_elapsed,
        parallel_elapsed,
        rows: sequential.dataset.len(),
        identical,
    })
}
