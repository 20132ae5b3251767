//! Flood risk analysis service.
//!
//! Ingests environmental sensor readings (water level, rain rate, soil and
//! air humidity, air temperature) and classifies flood risk with a decision
//! tree trained on the stored history, overridden by hard hydrological
//! thresholds.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod store;

pub use alert::RiskAnalyzer;
pub use model::{AnalysisResult, Reading, RiskError, RiskLabel, Severity};
