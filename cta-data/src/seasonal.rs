//! Per-season summary statistics for a single city.

use cta_model::Season;
use std::collections::BTreeMap;

/// Mean and sample standard deviation of one city+season group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonStats {
    pub mean: f64,
    /// NaN when the group has fewer than two readings
    pub std: f64,
    pub count: usize,
}

impl SeasonStats {
    /// Summarize a group of temperatures.
    ///
    /// Uses the sample standard deviation (n - 1 denominator). Non-finite
    /// inputs propagate into both statistics.
    pub fn from_values(values: &[f64]) -> SeasonStats {
        let count = values.len();
        if count == 0 {
            return SeasonStats {
                mean: f64::NAN,
                std: f64::NAN,
                count,
            };
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            f64::NAN
        } else {
            let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        };
        SeasonStats { mean, std, count }
    }

    /// `(mean - sigma * std, mean + sigma * std)`
    pub fn bounds(&self, sigma: f64) -> (f64, f64) {
        (self.mean - sigma * self.std, self.mean + sigma * self.std)
    }
}

/// Group readings by season and summarize each group.
///
/// Values are accumulated in the order given, which keeps the sums (and so
/// the statistics) reproducible for a given input order.
pub fn season_stats<I>(readings: I) -> BTreeMap<Season, SeasonStats>
where
    I: IntoIterator<Item = (Season, f64)>,
{
    let mut groups: BTreeMap<Season, Vec<f64>> = BTreeMap::new();
    for (season, temperature) in readings {
        groups.entry(season).or_default().push(temperature);
    }
    groups
        .into_iter()
        .map(|(season, values)| (season, SeasonStats::from_values(&values)))
        .collect()
}
