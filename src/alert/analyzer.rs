//! Risk analyzer: the hybrid model + rules pipeline.
//!
//! Precedence, first match returns:
//! 1. trailing 24h rain sum at or above the critical amount → Danger
//! 2. water level at or above flood stage                  → Danger
//! 3. model prediction, raised to Alert at the alert stage
//!
//! The model is only consulted (and lazily trained) when neither Danger
//! override fired. Store and validation errors are returned to the caller
//! rather than replaced with a reassuring status.

use super::thresholds;
use crate::analysis::rainfall::accumulated_rain_24h;
use crate::analysis::risk_model::RiskModel;
use crate::config::{ModelSettings, RiskThresholds, ServiceConfig};
use crate::logging::{self, Component};
use crate::model::{AnalysisResult, Reading, RiskError};
use crate::store::ReadingStore;

pub struct RiskAnalyzer<S: ReadingStore> {
    store: S,
    model: RiskModel,
    thresholds: RiskThresholds,
}

impl<S: ReadingStore> RiskAnalyzer<S> {
    pub fn new(store: S, thresholds: RiskThresholds, settings: ModelSettings) -> Self {
        let model = RiskModel::new(thresholds.clone(), settings);
        RiskAnalyzer {
            store,
            model,
            thresholds,
        }
    }

    pub fn from_config(store: S, config: &ServiceConfig) -> Self {
        Self::new(store, config.thresholds.clone(), config.model.clone())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn model(&self) -> &RiskModel {
        &self.model
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Classifies `reading`.
    pub fn analyze(&self, reading: &Reading) -> Result<AnalysisResult, RiskError> {
        reading.validate()?;
        let sensor = Some(reading.sensor_id.as_str());

        let rain_24h = accumulated_rain_24h(&self.store, reading.timestamp)?;
        logging::debug(
            Component::Analyzer,
            sensor,
            &format!("Accumulated rain over 24h: {:.1}mm", rain_24h),
        );
        if let Some(result) = thresholds::check_accumulated_rain(rain_24h, &self.thresholds) {
            logging::warn(Component::Analyzer, sensor, &result.message);
            return Ok(result);
        }

        if let Some(result) = thresholds::check_flood_stage(reading, &self.thresholds) {
            logging::warn(Component::Analyzer, sensor, &result.message);
            return Ok(result);
        }

        let model_label = self.model.predict(&self.store, reading)?;
        let result = thresholds::resolve_model_label(reading, model_label, &self.thresholds);
        logging::debug(
            Component::Analyzer,
            sensor,
            &format!("Model said {}, final status {}", model_label, result.status),
        );
        Ok(result)
    }
}
