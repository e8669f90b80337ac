//! Statistical processing for city temperature observations.
//!
//! This crate turns a batch of raw observations into per-city rolling means,
//! per-season bounds and anomaly flags, and answers ad-hoc anomaly queries
//! against those bounds.

pub mod batch;
pub mod city;
pub mod live;
pub mod performance;
pub mod rolling;
pub mod seasonal;

pub use batch::{analyze_dataset, BatchOutcome, ExecutionMode, SkippedPartition};
pub use city::analyze_city;
pub use config::AnalysisConfig;
pub use live::{classify, BoundsTable, LiveVerdict, SeasonBounds};
pub use performance::{compare, PerformanceReport};

/// Analysis parameters
pub mod config {
    use cta_model::{AnomalyError, Result};
    use serde::{Deserialize, Serialize};

    /// Number of trailing observations averaged by the rolling mean.
    pub const ROLLING_WINDOW: usize = 30;

    /// Half-width of the anomaly band, in standard deviations.
    pub const BOUND_SIGMA: f64 = 2.0;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct AnalysisConfig {
        /// Rolling window length; the window shrinks to what is available
        /// at the start of a series (minimum one observation)
        pub window: usize,
        /// Bounds are `season_mean ± sigma * season_std`
        pub sigma: f64,
    }

    impl Default for AnalysisConfig {
        fn default() -> Self {
            AnalysisConfig {
                window: ROLLING_WINDOW,
                sigma: BOUND_SIGMA,
            }
        }
    }

    impl AnalysisConfig {
        pub fn validate(&self) -> Result<()> {
            if self.window == 0 {
                return Err(AnomalyError::Config(
                    "rolling window must hold at least one observation".to_string(),
                ));
            }
            if !self.sigma.is_finite() || self.sigma < 0.0 {
                return Err(AnomalyError::Config(format!(
                    "sigma must be a finite non-negative number, got {}",
                    self.sigma
                )));
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_default_is_canonical() {
            let config = AnalysisConfig::default();
            assert_eq!(config.window, 30);
            assert_eq!(config.sigma, 2.0);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_validate_rejects_out_of_range() {
            let zero_window = AnalysisConfig { window: 0, ..Default::default() };
            assert!(matches!(zero_window.validate(), Err(AnomalyError::Config(_))));

            let negative = AnalysisConfig { sigma: -1.0, ..Default::default() };
            assert!(negative.validate().is_err());

            let nan = AnalysisConfig { sigma: f64::NAN, ..Default::default() };
            assert!(nan.validate().is_err());
        }
    }
}
