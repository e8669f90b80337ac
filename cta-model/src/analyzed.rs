use crate::{error::Result, season::Season};
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::{io::Write, path::Path};

/// An observation augmented with its rolling and seasonal statistics.
///
/// `season_std` is NaN when the city+season group holds fewer than two
/// readings; the bounds are then NaN too and `is_anomaly` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedObservation {
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub season: Season,
    /// Trailing mean over up to the last 30 readings of the city, inclusive
    pub rolling_mean: f64,
    pub season_mean: f64,
    pub season_std: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub is_anomaly: bool,
}

impl AnalyzedObservation {
    /// Compare every field, treating floats by their bit pattern so that NaN
    /// statistics compare equal to themselves.
    pub fn bitwise_eq(&self, other: &AnalyzedObservation) -> bool {
        self.city == other.city
            && self.timestamp == other.timestamp
            && self.season == other.season
            && self.is_anomaly == other.is_anomaly
            && self
                .float_fields()
                .iter()
                .zip(other.float_fields().iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    fn float_fields(&self) -> [f64; 6] {
        [
            self.temperature,
            self.rolling_mean,
            self.season_mean,
            self.season_std,
            self.lower_bound,
            self.upper_bound,
        ]
    }
}

/// Analyzed observations ordered by city, then timestamp ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzedDataset(Vec<AnalyzedObservation>);

impl AnalyzedDataset {
    /// Build a dataset from rows in any order. Rows are stably sorted by
    /// (city, timestamp), so equal keys keep their relative order.
    pub fn from_rows(mut rows: Vec<AnalyzedObservation>) -> Self {
        rows.sort_by(|a, b| a.city.cmp(&b.city).then(a.timestamp.cmp(&b.timestamp)));
        AnalyzedDataset(rows)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalyzedObservation> {
        self.0.iter()
    }

    pub fn rows(&self) -> &[AnalyzedObservation] {
        &self.0
    }

    /// Rows of one city, in timestamp order.
    pub fn for_city<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a AnalyzedObservation> + 'a {
        self.0.iter().filter(move |row| row.city == city)
    }

    /// Distinct cities, in dataset order.
    pub fn cities(&self) -> Vec<&str> {
        let mut cities: Vec<&str> = self.0.iter().map(|row| row.city.as_str()).collect();
        cities.dedup();
        cities
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &AnalyzedObservation> {
        self.0.iter().filter(|row| row.is_anomaly)
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies().count()
    }

    /// True when both datasets hold the same rows with bit-identical values.
    pub fn bitwise_eq(&self, other: &AnalyzedDataset) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.bitwise_eq(b))
    }

    /// Write the dataset as CSV with a header row.
    ///
    /// Columns: `city,timestamp,temperature,season,rolling_mean,season_mean,season_std,lower_bound,upper_bound,is_anomaly`
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
        for row in &self.0 {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the dataset as CSV to a file, replacing any existing content.
    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_csv(file)?;
        log::info!(
            "Wrote {} analyzed observations to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AnalyzedDataset {
    type Item = &'a AnalyzedObservation;
    type IntoIter = std::slice::Iter<'a, AnalyzedObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
