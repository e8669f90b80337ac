//! Classification of a single, freshly observed temperature against the
//! seasonal bounds of a previously analyzed dataset.

use cta_model::{AnalyzedDataset, AnomalyError, Result, Season};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anomaly band of one city+season group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonBounds {
    pub mean: f64,
    pub std: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Number of observations the group was computed from
    pub count: usize,
}

/// True when `temperature` lies strictly outside the bounds. Undefined (NaN)
/// bounds never flag.
pub fn classify(temperature: f64, bounds: &SeasonBounds) -> bool {
    temperature < bounds.lower_bound || temperature > bounds.upper_bound
}

/// Outcome of a live classification, with the values that were compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveVerdict {
    pub city: String,
    pub season: Season,
    pub temperature: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub is_anomaly: bool,
}

/// One flattened entry of a [`BoundsTable`], as exported to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsRecord<'a> {
    pub city: &'a str,
    pub season: Season,
    #[serde(flatten)]
    pub bounds: SeasonBounds,
}

/// Seasonal bounds per (city, season), collected from an analyzed dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsTable(BTreeMap<(String, Season), SeasonBounds>);

impl BoundsTable {
    /// Collect the bounds of every city+season group present in `dataset`.
    ///
    /// All rows of a group carry the same statistics, so the first row seen
    /// provides them and later rows only add to the count.
    pub fn from_dataset(dataset: &AnalyzedDataset) -> BoundsTable {
        let mut table: BTreeMap<(String, Season), SeasonBounds> = BTreeMap::new();
        for row in dataset {
            table
                .entry((row.city.clone(), row.season))
                .and_modify(|bounds| bounds.count += 1)
                .or_insert(SeasonBounds {
                    mean: row.season_mean,
                    std: row.season_std,
                    lower_bound: row.lower_bound,
                    upper_bound: row.upper_bound,
                    count: 1,
                });
        }
        BoundsTable(table)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, city: &str, season: Season) -> Option<&SeasonBounds> {
        self.0.get(&(city.to_string(), season))
    }

    /// Classify one observation of `city` taken in `season`.
    ///
    /// A city+season group absent from the analyzed dataset is a
    /// [`AnomalyError::LookupMiss`]; no default verdict is produced.
    pub fn classify(&self, city: &str, season: Season, temperature: f64) -> Result<LiveVerdict> {
        let bounds = self.get(city, season).ok_or_else(|| AnomalyError::LookupMiss {
            city: city.to_string(),
            season,
        })?;
        Ok(LiveVerdict {
            city: city.to_string(),
            season,
            temperature,
            lower_bound: bounds.lower_bound,
            upper_bound: bounds.upper_bound,
            is_anomaly: classify(temperature, bounds),
        })
    }

    pub fn records(&self) -> Vec<BoundsRecord<'_>> {
        self.0
            .iter()
            .map(|((city, season), bounds)| BoundsRecord {
                city,
                season: *season,
                bounds: *bounds,
            })
            .collect()
    }

    /// Pretty JSON array of all groups. Undefined statistics become `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records())?)
    }
}
