/// Alerting for the flood risk service.
///
/// Submodules:
/// - `thresholds` : override rules layered on the model's prediction.
/// - `analyzer`   : `RiskAnalyzer`, which runs rules and model in order.
/// - `stalenesses`: age check for the latest stored reading.

pub mod analyzer;
pub mod stalenesses;
pub mod thresholds;

pub use analyzer::RiskAnalyzer;
