//! Command implementations for CTA CLI.
//!
//! Provides subcommands for analyzing a temperature CSV, comparing the
//! sequential and parallel execution paths, and classifying a single live
//! reading against the computed seasonal bounds.

use clap::{Args, Subcommand};
use cta_data::{
    config::{BOUND_SIGMA, ROLLING_WINDOW},
    AnalysisConfig, ExecutionMode,
};
use cta_model::Season;
use std::path::PathBuf;

pub mod analyze;
pub mod classify;

/// Parameters shared by every command that runs the analysis.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Number of trailing observations in the rolling mean
    #[arg(long, default_value_t = ROLLING_WINDOW)]
    pub window: usize,

    /// Width of the anomaly band in standard deviations
    #[arg(long, default_value_t = BOUND_SIGMA)]
    pub sigma: f64,

    /// Worker threads for parallel mode (defaults to one per CPU)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,
}

impl AnalysisArgs {
    pub fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            window: self.window,
            sigma: self.sigma,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Flag anomalous readings per city and season
    Analyze {
        /// Input CSV with city, timestamp (or date) and temperature columns
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Output path for the analyzed observations CSV
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output path for the per-city, per-season bounds JSON
        #[arg(short = 'b', long)]
        bounds_json: Option<PathBuf>,

        /// Execution mode: sequential or parallel
        #[arg(short = 'm', long, default_value_t = ExecutionMode::Parallel)]
        mode: ExecutionMode,

        /// Abort if the analysis takes longer than this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Time the sequential and parallel execution paths on the same input
    Compare {
        /// Input CSV with city, timestamp (or date) and temperature columns
        #[arg(short = 'i', long)]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Classify one live temperature reading for a city
    Classify {
        /// Input CSV the seasonal bounds are computed from
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// City of the reading
        #[arg(short = 'c', long)]
        city: String,

        /// Observed temperature
        #[arg(short = 't', long, allow_hyphen_values = true)]
        temperature: f64,

        /// Season of the reading (winter, spring, summer, autumn)
        #[arg(short = 's', long, conflicts_with = "date")]
        season: Option<Season>,

        /// Date of the reading (YYYY-MM-DD); defaults to today
        #[arg(short = 'd', long)]
        date: Option<String>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Analyze {
            input,
            output,
            bounds_json,
            mode,
            timeout_secs,
            analysis,
        } => {
            let request = analyze::AnalyzeRequest {
                input,
                output,
                bounds_json,
                mode,
                workers: analysis.workers,
                config: analysis.config(),
                timeout_secs,
            };
            analyze::run_analyze(request).await.map(|_| ())
        }
        Command::Compare { input, analysis } => {
            analyze::run_compare(&input, analysis.workers, analysis.config())
                .await
                .map(|_| ())
        }
        Command::Classify {
            input,
            city,
            temperature,
            season,
            date,
            analysis,
        } => {
            let season = classify::resolve_season(season, date.as_deref())?;
            classify::run_classify(&input, &city, season, temperature, &analysis)
                .await
                .map(|_| ())
        }
    }
}
