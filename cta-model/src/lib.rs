pub mod analyzed;
pub mod error;
pub mod observation;
pub mod season;

pub use analyzed::{AnalyzedDataset, AnalyzedObservation};
pub use error::{AnomalyError, Result};
pub use observation::Observation;
pub use season::Season;
