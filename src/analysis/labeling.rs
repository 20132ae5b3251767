//! Ground-truth risk labeling.
//!
//! Training labels are derived deterministically from a reading's own
//! measurements. Rules are evaluated in order and the first match wins:
//!
//! 1. water level at or above flood stage           → Danger
//! 2. rain rate above the extreme rate               → Danger
//! 3. water level at or above alert stage            → Alert
//! 4. strong rain on highly humid soil               → Alert
//! 5. moderate rain on saturated soil                → Alert
//! 6. otherwise                                      → Normal

use crate::config::RiskThresholds;
use crate::model::{Reading, RiskLabel};

/// Labels one reading. Never returns `Indeterminate`.
pub fn label(reading: &Reading, t: &RiskThresholds) -> RiskLabel {
    let level = reading.water_level_cm;
    let rain = reading.rain_rate_mm_per_h;
    let soil = reading.soil_humidity_pct;

    if level >= t.flood_stage_cm {
        RiskLabel::Danger
    } else if rain > t.extreme_rain_mm_h {
        RiskLabel::Danger
    } else if level >= t.alert_stage_cm {
        RiskLabel::Alert
    } else if rain > t.strong_rain_mm_h && soil > t.high_soil_humidity_pct {
        RiskLabel::Alert
    } else if rain > t.moderate_rain_mm_h && soil > t.saturated_soil_humidity_pct {
        RiskLabel::Alert
    } else {
        RiskLabel::Normal
    }
}

/// A reading paired with its ground-truth label. Exists only during training.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledReading {
    pub reading: Reading,
    pub label: RiskLabel,
}

/// Labels every reading in `readings`, preserving order.
pub fn label_all(readings: &[Reading], t: &RiskThresholds) -> Vec<LabeledReading> {
    readings
        .iter()
        .map(|r| LabeledReading {
            reading: r.clone(),
            label: label(r, t),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(level: f64, rain: f64, soil: f64) -> Reading {
        let ts = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Reading::new(ts, "s1", level, rain, soil, 25.0, 85.0)
    }

    fn defaults() -> RiskThresholds {
        RiskThresholds::default()
    }

    // --- Danger -------------------------------------------------------------

    #[test]
    fn test_flood_stage_is_danger_regardless_of_other_fields() {
        let t = defaults();
        for (rain, soil) in [(0.0, 0.0), (3.0, 40.0), (30.0, 90.0), (80.0, 100.0)] {
            assert_eq!(label(&reading(400.0, rain, soil), &t), RiskLabel::Danger);
            assert_eq!(label(&reading(455.5, rain, soil), &t), RiskLabel::Danger);
        }
    }

    #[test]
    fn test_extreme_rain_is_danger_strictly_above_threshold() {
        let t = defaults();
        assert_eq!(label(&reading(100.0, 50.1, 10.0), &t), RiskLabel::Danger);
        // 50.0 is not above 50.0, and soil is dry: Normal.
        assert_eq!(label(&reading(100.0, 50.0, 10.0), &t), RiskLabel::Normal);
    }

    // --- Alert --------------------------------------------------------------

    #[test]
    fn test_alert_stage_is_inclusive() {
        let t = defaults();
        assert_eq!(label(&reading(300.0, 0.0, 50.0), &t), RiskLabel::Alert);
        assert_eq!(label(&reading(299.9, 0.0, 50.0), &t), RiskLabel::Normal);
    }

    #[test]
    fn test_strong_rain_needs_humid_soil() {
        let t = defaults();
        assert_eq!(label(&reading(100.0, 30.0, 86.0), &t), RiskLabel::Alert);
        assert_eq!(label(&reading(100.0, 30.0, 85.0), &t), RiskLabel::Normal);
        assert_eq!(label(&reading(100.0, 25.0, 90.0), &t), RiskLabel::Normal);
    }

    #[test]
    fn test_moderate_rain_needs_saturated_soil() {
        let t = defaults();
        assert_eq!(label(&reading(100.0, 6.0, 96.0), &t), RiskLabel::Alert);
        assert_eq!(label(&reading(100.0, 6.0, 95.0), &t), RiskLabel::Normal);
        assert_eq!(label(&reading(100.0, 5.0, 99.0), &t), RiskLabel::Normal);
    }

    // --- Configuration ------------------------------------------------------

    #[test]
    fn test_custom_thresholds_are_honored() {
        let t = RiskThresholds {
            flood_stage_cm: 250.0,
            alert_stage_cm: 180.0,
            ..RiskThresholds::default()
        };
        assert_eq!(label(&reading(260.0, 0.0, 50.0), &t), RiskLabel::Danger);
        assert_eq!(label(&reading(200.0, 0.0, 50.0), &t), RiskLabel::Alert);
    }

    #[test]
    fn test_label_all_preserves_order() {
        let t = defaults();
        let rows = vec![
            reading(100.0, 0.0, 50.0),
            reading(410.0, 0.0, 50.0),
            reading(320.0, 0.0, 50.0),
        ];
        let labels: Vec<_> = label_all(&rows, &t).into_iter().map(|l| l.label).collect();
        assert_eq!(labels, vec![RiskLabel::Normal, RiskLabel::Danger, RiskLabel::Alert]);
    }
}
