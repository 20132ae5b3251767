//! Threshold and model configuration.
//!
//! The risk thresholds encode location-specific hydrological calibration, so
//! they are read from a TOML file rather than embedded in the rules. Every
//! key is optional; anything left out falls back to the reference
//! calibration below.
//!
//! ```toml
//! [thresholds]
//! flood_stage_cm = 400.0
//! alert_stage_cm = 300.0
//! rain_24h_critical_mm = 100.0
//!
//! [model]
//! seed = 42
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./floodrisk.toml";

/// Environment variable that overrides `DEFAULT_CONFIG_PATH`.
pub const CONFIG_PATH_ENV: &str = "FLOODRISK_CONFIG";

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Domain thresholds used by the labeling rule and the override rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskThresholds {
    /// Water level at which danger is declared regardless of other signals.
    pub flood_stage_cm: f64,
    /// Water level indicating elevated risk requiring monitoring.
    pub alert_stage_cm: f64,
    /// Rain rate above which a reading alone is labeled Danger.
    pub extreme_rain_mm_h: f64,
    pub strong_rain_mm_h: f64,
    pub high_soil_humidity_pct: f64,
    pub moderate_rain_mm_h: f64,
    pub saturated_soil_humidity_pct: f64,
    /// Trailing 24h rain sum that forces Danger.
    pub rain_24h_critical_mm: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            flood_stage_cm: 400.0,
            alert_stage_cm: 300.0,
            extreme_rain_mm_h: 50.0,
            strong_rain_mm_h: 25.0,
            high_soil_humidity_pct: 85.0,
            moderate_rain_mm_h: 5.0,
            saturated_soil_humidity_pct: 95.0,
            rain_24h_critical_mm: 100.0,
        }
    }
}

impl RiskThresholds {
    /// Checks that the thresholds are positive and ordered so the rules
    /// escalate in the intended direction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("flood_stage_cm", self.flood_stage_cm),
            ("alert_stage_cm", self.alert_stage_cm),
            ("extreme_rain_mm_h", self.extreme_rain_mm_h),
            ("strong_rain_mm_h", self.strong_rain_mm_h),
            ("high_soil_humidity_pct", self.high_soil_humidity_pct),
            ("moderate_rain_mm_h", self.moderate_rain_mm_h),
            ("saturated_soil_humidity_pct", self.saturated_soil_humidity_pct),
            ("rain_24h_critical_mm", self.rain_24h_critical_mm),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.alert_stage_cm >= self.flood_stage_cm {
            return Err(ConfigError::Invalid(format!(
                "alert_stage_cm ({}) must be below flood_stage_cm ({})",
                self.alert_stage_cm, self.flood_stage_cm
            )));
        }
        if !(self.moderate_rain_mm_h < self.strong_rain_mm_h
            && self.strong_rain_mm_h < self.extreme_rain_mm_h)
        {
            return Err(ConfigError::Invalid(format!(
                "rain rates must satisfy moderate ({}) < strong ({}) < extreme ({})",
                self.moderate_rain_mm_h, self.strong_rain_mm_h, self.extreme_rain_mm_h
            )));
        }
        if self.high_soil_humidity_pct > self.saturated_soil_humidity_pct {
            return Err(ConfigError::Invalid(format!(
                "high_soil_humidity_pct ({}) must not exceed saturated_soil_humidity_pct ({})",
                self.high_soil_humidity_pct, self.saturated_soil_humidity_pct
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Model settings
// ---------------------------------------------------------------------------

/// Training parameters for the risk classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSettings {
    /// Fraction of each class held out for accuracy reporting.
    pub test_fraction: f64,
    /// Seed for the train/test shuffle. Same data + same seed = same tree.
    pub seed: u64,
    /// Maximum tree depth; unlimited when absent.
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples than this become leaves.
    pub min_samples_split: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            test_fraction: 0.2,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ModelSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_fraction must be between 0 and 1 (exclusive), got {}",
                self.test_fraction
            )));
        }
        if self.min_samples_split < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service configuration
// ---------------------------------------------------------------------------

/// Everything read from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub thresholds: RiskThresholds,
    pub model: ModelSettings,
}

impl ServiceConfig {
    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.thresholds.validate()?;
        config.model.validate()?;
        Ok(config)
    }
}

/// Loads configuration from `path`.
///
/// Returns `Ok(None)` if the file does not exist so the caller can fall back
/// to `ServiceConfig::default()`.
pub fn load_config(path: impl AsRef<Path>) -> Result<Option<ServiceConfig>, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    ServiceConfig::from_toml_str(&content).map(Some)
}

/// Resolves the configuration path from `FLOODRISK_CONFIG`, falling back to
/// `DEFAULT_CONFIG_PATH`.
pub fn config_path_from_env() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Io(String),
    /// The file is not valid TOML or has unexpected keys/types.
    Parse(String),
    /// Values parsed but violate an ordering or range constraint.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
