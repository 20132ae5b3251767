//! Reading, RiskLabel, Severity, AnalysisResult, RiskError
//! core data structures and error handling
//!
//! Core data types for the flood risk analysis service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no I/O, only types and the small invariants that belong to
//! them (second-precision timestamps, finite measurements).

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timestamps and features
// ---------------------------------------------------------------------------

/// Storage format for reading timestamps: naive local time, second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Feature names in the fixed order the classifier consumes them.
pub const FEATURE_NAMES: [&str; 5] = [
    "water_level_cm",
    "rain_rate_mm_per_h",
    "soil_humidity_pct",
    "air_temp_c",
    "air_humidity_pct",
];

/// Number of numeric features per reading.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A single environmental sensor sample.
///
/// Readings are immutable once stored. The timestamp is naive local time
/// truncated to whole seconds so that range queries against the store use
/// the same precision the rows were written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub sensor_id: String,
    pub water_level_cm: f64,
    pub rain_rate_mm_per_h: f64,
    pub soil_humidity_pct: f64,
    pub air_temp_c: f64,
    pub air_humidity_pct: f64,
}

impl Reading {
    /// Builds a reading, dropping any sub-second component of `timestamp`.
    pub fn new(
        timestamp: NaiveDateTime,
        sensor_id: impl Into<String>,
        water_level_cm: f64,
        rain_rate_mm_per_h: f64,
        soil_humidity_pct: f64,
        air_temp_c: f64,
        air_humidity_pct: f64,
    ) -> Self {
        Reading {
            timestamp: truncate_to_second(timestamp),
            sensor_id: sensor_id.into(),
            water_level_cm,
            rain_rate_mm_per_h,
            soil_humidity_pct,
            air_temp_c,
            air_humidity_pct,
        }
    }

    /// Numeric features in `FEATURE_NAMES` order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.water_level_cm,
            self.rain_rate_mm_per_h,
            self.soil_humidity_pct,
            self.air_temp_c,
            self.air_humidity_pct,
        ]
    }

    /// Rejects readings carrying NaN or infinite measurements.
    ///
    /// Values are never coerced to zero: a malformed reading must surface
    /// to the caller instead of being classified.
    pub fn validate(&self) -> Result<(), RiskError> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.features()) {
            if !value.is_finite() {
                return Err(RiskError::MalformedReading(format!(
                    "{} is not a finite number ({}) in reading from '{}' at {}",
                    name,
                    value,
                    self.sensor_id,
                    self.timestamp.format(TIMESTAMP_FORMAT)
                )));
            }
        }
        Ok(())
    }
}

/// Drops the sub-second part of a timestamp.
pub fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

// ---------------------------------------------------------------------------
// Risk labels and severity
// ---------------------------------------------------------------------------

/// Flood risk classification, in ascending order of severity.
///
/// `Indeterminate` is only produced when the model has no usable history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLabel {
    Indeterminate,
    Normal,
    Alert,
    Danger,
}

impl RiskLabel {
    /// The three labels the ground-truth rule and the classifier can emit.
    pub const CLASSES: [RiskLabel; 3] = [RiskLabel::Normal, RiskLabel::Alert, RiskLabel::Danger];

    pub fn severity(self) -> Severity {
        match self {
            RiskLabel::Danger => Severity::Red,
            RiskLabel::Alert => Severity::Orange,
            RiskLabel::Normal => Severity::Green,
            RiskLabel::Indeterminate => Severity::None,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::Indeterminate => write!(f, "Indeterminate"),
            RiskLabel::Normal => write!(f, "Normal"),
            RiskLabel::Alert => write!(f, "Alert"),
            RiskLabel::Danger => write!(f, "Danger"),
        }
    }
}

/// Display color attached to a final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Orange,
    Red,
    None,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Green => write!(f, "green"),
            Severity::Orange => write!(f, "orange"),
            Severity::Red => write!(f, "red"),
            Severity::None => write!(f, "none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// Final output of one analysis call. Serializes as
/// `{"status": ..., "severity": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub status: RiskLabel,
    pub severity: Severity,
    pub message: String,
}

impl AnalysisResult {
    /// Builds a result whose severity follows from `status`.
    pub fn new(status: RiskLabel, message: String) -> Self {
        AnalysisResult {
            status,
            severity: status.severity(),
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while analyzing flood risk.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskError {
    /// The reading store could not be reached or queried.
    StoreUnavailable(String),
    /// A risk class has too few examples for a stratified split.
    InsufficientData { label: RiskLabel, count: usize },
    /// No historical readings exist yet.
    EmptyHistory,
    /// A reading is missing a numeric field or carries a non-numeric value.
    MalformedReading(String),
}

impl fmt::Display for RiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskError::StoreUnavailable(msg) => write!(f, "Reading store unavailable: {}", msg),
            RiskError::InsufficientData { label, count } => write!(
                f,
                "Insufficient data: class {} has {} example(s), at least 2 are required",
                label, count
            ),
            RiskError::EmptyHistory => write!(f, "No historical readings available"),
            RiskError::MalformedReading(msg) => write!(f, "Malformed reading: {}", msg),
        }
    }
}

impl std::error::Error for RiskError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
