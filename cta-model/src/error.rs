/// Error types for the CTA library
use crate::season::Season;
use thiserror::Error;

/// Main error type for anomaly analysis operations
#[derive(Error, Debug)]
pub enum AnomalyError {
    /// A source row is missing a required field or holds an unparseable value.
    /// `line` is the 1-based line of the source file (the header is line 1).
    #[error("Ingestion failed at line {line}: {reason}")]
    Ingestion { line: u64, reason: String },

    /// One city's observations could not be summarized
    #[error("Analysis of city '{city}' failed ({rows} rows affected): {reason}")]
    PartitionAnalysis {
        city: String,
        rows: usize,
        reason: String,
    },

    /// Live classification asked for a city+season with no computed bounds
    #[error("No bounds computed for city '{city}' in {season}")]
    LookupMiss { city: String, season: Season },

    /// Worker pool dispatch or collection failed
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Analysis parameters are out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to read or write CSV data
    #[error("Failed to process CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to serialize JSON output
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using AnomalyError
pub type Result<T> = std::result::Result<T, AnomalyError>;
