//! Anomaly analysis of a single city's observations.

use crate::{config::AnalysisConfig, rolling::rolling_mean, seasonal::season_stats};
use cta_model::{AnalyzedObservation, AnomalyError, Observation, Result, Season};

/// Analyze every observation of one city.
///
/// The observations are stably sorted by timestamp, tagged with their season,
/// given a trailing rolling mean and joined to the mean and standard deviation
/// of their own season group. A reading is anomalous when it falls strictly
/// outside `season_mean ± sigma * season_std`; NaN bounds never flag.
///
/// Returns one row per input observation. An empty input yields an empty
/// output. A partition holding more than one city is rejected.
pub fn analyze_city(
    mut observations: Vec<Observation>,
    config: &AnalysisConfig,
) -> Result<Vec<AnalyzedObservation>> {
    let Some(first) = observations.first() else {
        return Ok(Vec::new());
    };
    let city = first.city.clone();
    if let Some(stray) = observations.iter().find(|obs| obs.city != city) {
        return Err(AnomalyError::PartitionAnalysis {
            rows: observations.len(),
            reason: format!("partition also contains city '{}'", stray.city),
            city,
        });
    }

    observations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let seasons: Vec<Season> = observations.iter().map(|obs| Season::of(&obs.timestamp)).collect();
    let temperatures: Vec<f64> = observations.iter().map(|obs| obs.temperature).collect();
    let rolling = rolling_mean(&temperatures, config.window);
    let stats = season_stats(seasons.iter().copied().zip(temperatures.iter().copied()));

    let mut analyzed = Vec::with_capacity(observations.len());
    for ((obs, season), rolling_mean) in observations.into_iter().zip(seasons).zip(rolling) {
        let group = stats.get(&season).ok_or_else(|| AnomalyError::PartitionAnalysis {
            city: city.clone(),
            rows: temperatures.len(),
            reason: format!("no statistics for {season}"),
        })?;
        let (lower_bound, upper_bound) = group.bounds(config.sigma);
        let is_anomaly = obs.temperature < lower_bound || obs.temperature > upper_bound;
        analyzed.push(AnalyzedObservation {
            city: obs.city,
            timestamp: obs.timestamp,
            temperature: obs.temperature,
            season,
            rolling_mean,
            season_mean: group.mean,
            season_std: group.std,
            lower_bound,
            upper_bound,
            is_anomaly,
        });
    }
    log::debug!(
        "Analyzed {} observations for {} ({} season groups)",
        analyzed.len(),
        city,
        stats.len()
    );
    Ok(analyzed)
}

#[cfg(test)]
mod tests {
    use super::analyze_city;
    use crate::config::AnalysisConfig;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use cta_model::{AnomalyError, Observation, Season};

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn paris_winter() -> Vec<Observation> {
        [-2.0, -1.0, 0.0, 1.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i, t)| Observation::new("Paris", at(2023, 1, 1 + i as u32), *t))
            .collect()
    }

    #[test]
    fn test_paris_winter_bounds() {
        let rows = analyze_city(paris_winter(), &AnalysisConfig::default()).unwrap();
        assert_eq!(rows.len(), 5);
        for row in &rows {
            assert_eq!(row.season, Season::Winter);
            assert_eq!(row.season_mean, 0.0);
            assert!((row.season_std - 1.5811388).abs() < 1e-6);
            assert!((row.lower_bound + 3.1622776).abs() < 1e-6);
            assert!((row.upper_bound - 3.1622776).abs() < 1e-6);
            assert!(!row.is_anomaly);
        }
        assert_eq!(rows[0].rolling_mean, -2.0);
        assert_eq!(rows[1].rolling_mean, -1.5);
        assert_eq!(rows[4].rolling_mean, 0.0);
    }

    #[test]
    fn test_empty_partition() {
        let rows = analyze_city(Vec::new(), &AnalysisConfig::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unsorted_input_is_ordered_before_rolling() {
        let mut observations = paris_winter();
        observations.reverse();
        let rows = analyze_city(observations, &AnalysisConfig::default()).unwrap();
        let temps: Vec<f64> = rows.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(rows[1].rolling_mean, -1.5);
    }

    #[test]
    fn test_anomaly_is_strictly_outside_bounds() {
        let mut observations: Vec<Observation> = (0..20)
            .map(|i| Observation::new("Oslo", at(2023, 7, 1 + i), if i % 2 == 0 { 15.0 } else { 17.0 }))
            .collect();
        observations.push(Observation::new("Oslo", at(2023, 7, 25), 40.0));
        let rows = analyze_city(observations, &AnalysisConfig::default()).unwrap();
        for row in &rows {
            assert!(row.lower_bound <= row.season_mean);
            assert!(row.season_mean <= row.upper_bound);
            let outside = row.temperature < row.lower_bound || row.temperature > row.upper_bound;
            assert_eq!(row.is_anomaly, outside);
        }
        assert!(rows.last().unwrap().is_anomaly);
        assert_eq!(rows.iter().filter(|r| r.is_anomaly).count(), 1);
    }

    #[test]
    fn test_singleton_season_never_flags() {
        let mut observations = paris_winter();
        observations.push(Observation::new("Paris", at(2023, 6, 1), 99.0));
        let rows = analyze_city(observations, &AnalysisConfig::default()).unwrap();
        let summer: Vec<_> = rows.iter().filter(|r| r.season == Season::Summer).collect();
        assert_eq!(summer.len(), 1);
        assert!(summer[0].season_std.is_nan());
        assert!(summer[0].lower_bound.is_nan());
        assert!(!summer[0].is_anomaly);
        assert_eq!(summer[0].season_mean, 99.0);
        // winter statistics ignore the summer reading
        assert!(rows
            .iter()
            .filter(|r| r.season == Season::Winter)
            .all(|r| r.season_mean == 0.0));
    }

    #[test]
    fn test_rolling_mean_has_no_look_ahead() {
        let start = at(2023, 3, 1);
        let mut observations: Vec<Observation> = (0..60)
            .map(|i| Observation::new("Lima", start + Duration::days(i), 20.0))
            .collect();
        let baseline = analyze_city(observations.clone(), &AnalysisConfig::default()).unwrap();
        observations.push(Observation::new("Lima", start + Duration::days(60), 500.0));
        let spiked = analyze_city(observations, &AnalysisConfig::default()).unwrap();
        for (before, after) in baseline.iter().zip(spiked.iter()) {
            assert_eq!(before.rolling_mean, after.rolling_mean);
        }
        assert_eq!(spiked[60].rolling_mean, (29.0 * 20.0 + 500.0) / 30.0);
    }

    #[test]
    fn test_non_finite_temperature_degrades_gracefully() {
        let mut observations = paris_winter();
        observations.push(Observation::new("Paris", at(2023, 1, 20), f64::NAN));
        let rows = analyze_city(observations, &AnalysisConfig::default()).unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.season_mean.is_nan()));
        assert!(rows.iter().all(|r| !r.is_anomaly));
        assert!(rows[4].rolling_mean.is_finite());
        assert!(rows[5].rolling_mean.is_nan());
    }

    #[test]
    fn test_mixed_partition_is_rejected() {
        let mut observations = paris_winter();
        observations.push(Observation::new("Tokyo", at(2023, 1, 9), 3.0));
        match analyze_city(observations, &AnalysisConfig::default()).unwrap_err() {
            AnomalyError::PartitionAnalysis { city, rows, reason } => {
                assert_eq!(city, "Paris");
                assert_eq!(rows, 6);
                assert!(reason.contains("Tokyo"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
