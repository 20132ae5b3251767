//! Override rules applied on top of the model's prediction.
//!
//! Two rules can force Danger before the model is consulted (accumulated
//! rainfall, then flood stage). After the model runs, a level at or above
//! the alert stage makes the result Alert whatever the model said. Below
//! the alert stage the model's label stands, Danger included.
//!
//! Every message carries the measured value and the threshold involved.

use crate::config::RiskThresholds;
use crate::model::{AnalysisResult, Reading, RiskLabel};

/// Danger if the trailing 24h rain sum reached the critical amount.
pub fn check_accumulated_rain(rain_24h_mm: f64, t: &RiskThresholds) -> Option<AnalysisResult> {
    if rain_24h_mm < t.rain_24h_critical_mm {
        return None;
    }
    Some(AnalysisResult::new(
        RiskLabel::Danger,
        format!(
            "DANGER: accumulated rainfall of {:.1}mm in the last 24h reached the critical \
             threshold ({:.1}mm). Very high risk of overflow and flooding.",
            rain_24h_mm, t.rain_24h_critical_mm
        ),
    ))
}

/// Danger if the water level is at or above flood stage.
pub fn check_flood_stage(reading: &Reading, t: &RiskThresholds) -> Option<AnalysisResult> {
    if reading.water_level_cm < t.flood_stage_cm {
        return None;
    }
    Some(AnalysisResult::new(
        RiskLabel::Danger,
        format!(
            "DANGER: water level at {:.1}cm reached or exceeded the flood stage ({:.1}cm). \
             Evacuate risk areas!",
            reading.water_level_cm, t.flood_stage_cm
        ),
    ))
}

pub fn reaches_alert_stage(reading: &Reading, t: &RiskThresholds) -> bool {
    reading.water_level_cm >= t.alert_stage_cm
}

/// Final status once neither Danger override fired.
pub fn resolve_model_label(
    reading: &Reading,
    model_label: RiskLabel,
    t: &RiskThresholds,
) -> AnalysisResult {
    let level = reading.water_level_cm;

    // Flood stage is checked before the model runs.
    if reaches_alert_stage(reading, t) {
        return AnalysisResult::new(
            RiskLabel::Alert,
            format!(
                "ALERT: water level at {:.1}cm (alert stage: {:.1}cm). Monitor conditions.",
                level, t.alert_stage_cm
            ),
        );
    }

    match model_label {
        RiskLabel::Danger => AnalysisResult::new(
            RiskLabel::Danger,
            format!(
                "DANGER: critical conditions detected by the risk model (water level {:.1}cm, \
                 rain {:.1}mm/h, soil humidity {:.1}%). Flood stage: {:.1}cm.",
                level, reading.rain_rate_mm_per_h, reading.soil_humidity_pct, t.flood_stage_cm
            ),
        ),
        RiskLabel::Alert => AnalysisResult::new(
            RiskLabel::Alert,
            format!(
                "ALERT: risk model flagged elevated risk with rain at {:.1}mm/h on {:.1}% soil \
                 humidity (water level {:.1}cm, alert stage: {:.1}cm). Monitor conditions.",
                reading.rain_rate_mm_per_h, reading.soil_humidity_pct, level, t.alert_stage_cm
            ),
        ),
        RiskLabel::Normal => AnalysisResult::new(
            RiskLabel::Normal,
            format!(
                "NORMAL: stable conditions (water level {:.1}cm, alert stage: {:.1}cm).",
                level, t.alert_stage_cm
            ),
        ),
        _ => AnalysisResult::new(
            RiskLabel::Indeterminate,
            format!(
                "INDETERMINATE: not enough history to classify yet (water level {:.1}cm, \
                 alert stage: {:.1}cm).",
                level, t.alert_stage_cm
            ),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
