//! Live classification of a single reading.

use crate::{analyze::load_observations, analyze::run_blocking, AnalysisArgs};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use cta_data::{analyze_dataset, BoundsTable, ExecutionMode, LiveVerdict};
use cta_model::Season;
use log::info;
use std::path::Path;

/// Decide which season a live reading belongs to.
///
/// An explicit season wins, then an explicit date; only when neither is given
/// is today's local date used.
pub fn resolve_season(season: Option<Season>, date: Option<&str>) -> anyhow::Result<Season> {
    if let Some(season) = season {
        return Ok(season);
    }
    let date: NaiveDate = match date {
        Some(raw) => cta_utils::dates::parse_date(raw)
            .with_context(|| format!("Invalid reading date '{raw}'"))?,
        None => Local::now().naive_local().date(),
    };
    Ok(Season::of_date(&date))
}

/// Analyze the input CSV, then classify `temperature` for `city` in `season`.
pub async fn run_classify(
    input: &Path,
    city: &str,
    season: Season,
    temperature: f64,
    analysis: &AnalysisArgs,
) -> anyhow::Result<LiveVerdict> {
    let observations = load_observations(input)?;
    let workers = analysis.workers;
    let config = analysis.config();
    let outcome = run_blocking(None, move || {
        analyze_dataset(&observations, ExecutionMode::Parallel, workers, &config)
    })
    .await?;

    let table = BoundsTable::from_dataset(&outcome.dataset);
    let verdict = table.classify(city, season, temperature)?;
    info!(
        "{} in {}: {} against [{:.2}, {:.2}]",
        verdict.city, verdict.season, verdict.temperature, verdict.lower_bound, verdict.upper_bound
    );
    println!(
        "{} ({}): temperature {:.1} is {} (normal range {:.1} to {:.1})",
        verdict.city,
        verdict.season,
        verdict.temperature,
        if verdict.is_anomaly { "ANOMALOUS" } else { "normal" },
        verdict.lower_bound,
        verdict.upper_bound
    );
    Ok(verdict)
}
