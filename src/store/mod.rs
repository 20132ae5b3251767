//! Reading store access.
//!
//! The analysis core depends on storage only through `ReadingStore`: one
//! call returning the full history in timestamp order, and one summing a
//! numeric column over an inclusive time range. Any engine that can answer
//! those two questions can back the analyzer.
//!
//! Submodules:
//! - `memory`  : in-process store used by tests and dry runs.
//! - `pg`      : PostgreSQL-backed store, plus schema bootstrap and append.

use chrono::NaiveDateTime;

use crate::model::{Reading, RiskError};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PostgresStore;

// ---------------------------------------------------------------------------
// Summable fields
// ---------------------------------------------------------------------------

/// Numeric reading columns that can be aggregated by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingField {
    WaterLevel,
    RainRate,
    SoilHumidity,
    AirTemp,
    AirHumidity,
}

impl ReadingField {
    /// Column name in the `sensor_readings` table.
    pub fn column(self) -> &'static str {
        match self {
            ReadingField::WaterLevel => "water_level_cm",
            ReadingField::RainRate => "rain_rate_mm_per_h",
            ReadingField::SoilHumidity => "soil_humidity_pct",
            ReadingField::AirTemp => "air_temp_c",
            ReadingField::AirHumidity => "air_humidity_pct",
        }
    }

    /// Reads this field from an in-memory reading.
    pub fn value_of(self, reading: &Reading) -> f64 {
        match self {
            ReadingField::WaterLevel => reading.water_level_cm,
            ReadingField::RainRate => reading.rain_rate_mm_per_h,
            ReadingField::SoilHumidity => reading.soil_humidity_pct,
            ReadingField::AirTemp => reading.air_temp_c,
            ReadingField::AirHumidity => reading.air_humidity_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Read operations the risk analysis core needs from storage.
pub trait ReadingStore: Send + Sync {
    /// Every stored reading, ascending by timestamp. Empty history is
    /// `Ok(vec![])`; an unreachable store is `StoreUnavailable`.
    fn all_readings(&self) -> Result<Vec<Reading>, RiskError>;

    /// Sum of `field` over readings with `start <= timestamp <= end`.
    ///
    /// `Ok(None)` means no rows matched.
    fn sum_field_in_range(
        &self,
        field: ReadingField,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<f64>, RiskError>;
}

impl<S: ReadingStore + ?Sized> ReadingStore for std::sync::Arc<S> {
    fn all_readings(&self) -> Result<Vec<Reading>, RiskError> {
        (**self).all_readings()
    }

    fn sum_field_in_range(
        &self,
        field: ReadingField,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<f64>, RiskError> {
        (**self).sum_field_in_range(field, start, end)
    }
}
