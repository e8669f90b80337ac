use crate::error::{AnomalyError, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, io::Read, path::Path};

/// Header name of the city column.
pub const CITY_COLUMN: &str = "city";

/// Header names accepted for the timestamp column.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["timestamp", "date"];

/// Header name of the temperature column.
pub const TEMPERATURE_COLUMN: &str = "temperature";

/// A single temperature reading for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    pub timestamp: NaiveDateTime,
    /// Degrees, in whatever unit the source file uses
    pub temperature: f64,
}

/// Column positions of the required fields within a source CSV.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    city: usize,
    timestamp: usize,
    temperature: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<ColumnLayout> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let missing = |name: &str| AnomalyError::Ingestion {
            line: 1,
            reason: format!("missing required column '{name}'"),
        };
        Ok(ColumnLayout {
            city: find(&[CITY_COLUMN]).ok_or_else(|| missing(CITY_COLUMN))?,
            timestamp: find(&TIMESTAMP_COLUMNS).ok_or_else(|| missing("timestamp"))?,
            temperature: find(&[TEMPERATURE_COLUMN]).ok_or_else(|| missing(TEMPERATURE_COLUMN))?,
        })
    }
}

impl Observation {
    pub fn new(city: impl Into<String>, timestamp: NaiveDateTime, temperature: f64) -> Self {
        Observation {
            city: city.into(),
            timestamp,
            temperature,
        }
    }

    /// Parse a CSV string (with header row) into Observations.
    ///
    /// Required columns are `city`, `timestamp` (or `date`) and `temperature`,
    /// matched case-insensitively in any position. Extra columns are ignored.
    ///
    /// # Example CSV
    /// ```text
    /// city,timestamp,temperature
    /// Paris,2023-01-01,-2.0
    /// Tokyo,2023-01-01,5.5
    /// ```
    pub fn parse_csv(csv_data: &str) -> Result<Vec<Observation>> {
        Observation::read_csv(csv_data.as_bytes())
    }

    /// Read observations from a CSV file on disk.
    pub fn read_csv_path(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
        let file = std::fs::File::open(path.as_ref())?;
        let observations = Observation::read_csv(file)?;
        log::info!(
            "Loaded {} observations from {}",
            observations.len(),
            path.as_ref().display()
        );
        Ok(observations)
    }

    /// Read observations from any CSV source. Malformed rows stop ingestion
    /// with the offending line number; nothing is coerced or skipped.
    pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Observation>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let layout = ColumnLayout::from_headers(rdr.headers().map_err(malformed_row)?)?;

        let mut observations = Vec::new();
        for row in rdr.records() {
            let record = row.map_err(malformed_row)?;
            observations.push(Observation::from_record(&record, layout)?);
        }
        Ok(observations)
    }

    fn from_record(record: &StringRecord, layout: ColumnLayout) -> Result<Observation> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |index: usize, name: &str| required_field(record, index, name, line);

        let city = field(layout.city, CITY_COLUMN)?;
        let timestamp = cta_utils::dates::parse_timestamp(field(layout.timestamp, "timestamp")?)
            .map_err(|e| AnomalyError::Ingestion {
                line,
                reason: e.to_string(),
            })?;
        let raw_temperature = field(layout.temperature, TEMPERATURE_COLUMN)?;
        let temperature = raw_temperature
            .parse::<f64>()
            .map_err(|_| AnomalyError::Ingestion {
                line,
                reason: format!("unparseable temperature '{raw_temperature}'"),
            })?;

        Ok(Observation {
            city: city.to_string(),
            timestamp,
            temperature,
        })
    }

    /// Group observations by city, preserving input order within each city.
    /// Cities iterate in lexicographic order.
    pub fn partition_by_city(observations: &[Observation]) -> BTreeMap<String, Vec<Observation>> {
        let mut result: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
        for obs in observations {
            result.entry(obs.city.clone()).or_default().push(obs.clone());
        }
        result
    }
}

/// A row the CSV reader itself rejected (bad UTF-8, broken quoting).
fn malformed_row(err: csv::Error) -> AnomalyError {
    AnomalyError::Ingestion {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        reason: err.to_string(),
    }
}

fn required_field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<&'r str> {
    match record.get(index).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AnomalyError::Ingestion {
            line,
            reason: format!("missing value for '{name}'"),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::Observation;
    use crate::error::AnomalyError;
    use chrono::{Datelike, NaiveDate};

    const STR_RESULT: &str = r#"city,timestamp,temperature,season
Paris,2023-01-01,-2.0,winter
Paris,2023-01-02,-1.0,winter
Tokyo,2023-01-01,5.5,winter
Paris,2023-07-14T12:00:00,24.5,summer
Tokyo,2023-07-14 09:30:00,31.0,summer
"#;

    #[test]
    fn test_parse_csv() {
        let observations = Observation::parse_csv(STR_RESULT).unwrap();
        assert_eq!(observations.len(), 5);
        assert_eq!(observations[0].city, "Paris");
        assert_eq!(observations[0].temperature, -2.0);
        assert_eq!(
            observations[0].timestamp.date(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
        assert_eq!(observations[4].timestamp.month(), 7);
    }

    #[test]
    fn test_parse_csv_accepts_date_header_and_any_column_order() {
        let csv = "temperature,Date,City\n12.5,2010-03-01,Berlin\n";
        let observations = Observation::parse_csv(csv).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].city, "Berlin");
        assert_eq!(observations[0].temperature, 12.5);
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let err = Observation::parse_csv("city,timestamp\nParis,2023-01-01\n").unwrap_err();
        match err {
            AnomalyError::Ingestion { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("temperature"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_csv_reports_offending_line() {
        let csv = "city,timestamp,temperature\nParis,2023-01-01,1.0\nParis,not-a-date,2.0\n";
        match Observation::parse_csv(csv).unwrap_err() {
            AnomalyError::Ingestion { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }

        let csv = "city,timestamp,temperature\nParis,2023-01-01,warm\n";
        match Observation::parse_csv(csv).unwrap_err() {
            AnomalyError::Ingestion { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("warm"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let csv = "city,timestamp,temperature\n,2023-01-01,1.0\n";
        assert!(matches!(
            Observation::parse_csv(csv),
            Err(AnomalyError::Ingestion { line: 2, .. })
        ));

        let csv = "city,timestamp,temperature\nParis,2023-01-01\n";
        assert!(matches!(
            Observation::parse_csv(csv),
            Err(AnomalyError::Ingestion { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_csv_invalid_utf8_row_is_an_ingestion_error() {
        let mut bytes = b"city,timestamp,temperature\nParis,2023-01-01,1.0\n".to_vec();
        bytes.extend_from_slice(b"Par\xffis,2023-01-02,2.0\n");
        match Observation::read_csv(bytes.as_slice()).unwrap_err() {
            AnomalyError::Ingestion { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_csv_keeps_non_finite_temperatures() {
        let csv = "city,timestamp,temperature\nParis,2023-01-01,NaN\nParis,2023-01-02,inf\n";
        let observations = Observation::parse_csv(csv).unwrap();
        assert!(observations[0].temperature.is_nan());
        assert!(observations[1].temperature.is_infinite());
    }

    #[test]
    fn test_partition_by_city() {
        let observations = Observation::parse_csv(STR_RESULT).unwrap();
        let partitions = Observation::partition_by_city(&observations);
        let cities: Vec<&String> = partitions.keys().collect();
        assert_eq!(cities, vec!["Paris", "Tokyo"]);
        assert_eq!(partitions["Paris"].len(), 3);
        assert_eq!(partitions["Tokyo"].len(), 2);
        assert!(partitions["Tokyo"].iter().all(|o| o.city == "Tokyo"));
        // input order is preserved inside a partition
        assert_eq!(partitions["Paris"][1].temperature, -1.0);
    }
}
