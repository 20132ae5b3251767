//! In-process reading store.
//!
//! Holds readings in a timestamp-sorted vector behind an `RwLock`. Range
//! sums are inclusive at both ends, matching SQL `BETWEEN`. Inserts are
//! validated and truncated to whole seconds, as `PostgresStore` does.

use chrono::NaiveDateTime;
use std::sync::RwLock;

use super::{ReadingField, ReadingStore};
use crate::logging::{self, Component};
use crate::model::{Reading, RiskError, truncate_to_second};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `readings` (in any order).
    /// Malformed readings are logged and skipped.
    pub fn with_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let store = Self::new();
        for reading in readings {
            if let Err(e) = store.insert_reading(reading) {
                logging::warn(Component::Store, None, &format!("Skipped reading: {}", e));
            }
        }
        store
    }

    /// Appends a reading, keeping rows ordered by timestamp. Readings with
    /// equal timestamps keep arrival order.
    pub fn insert_reading(&self, reading: Reading) -> Result<(), RiskError> {
        reading.validate()?;
        let reading = Reading {
            timestamp: truncate_to_second(reading.timestamp),
            ..reading
        };
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let pos = rows.partition_point(|r| r.timestamp <= reading.timestamp);
        rows.insert(pos, reading);
        Ok(())
    }

    /// Most recent reading, if any.
    pub fn latest_reading(&self) -> Result<Option<Reading>, RiskError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.last().cloned())
    }

    /// Readings with `start <= timestamp <= end`, ascending.
    pub fn readings_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reading>, RiskError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> RiskError {
    RiskError::StoreUnavailable("in-memory store lock poisoned".to_string())
}

impl ReadingStore for MemoryStore {
    fn all_readings(&self) -> Result<Vec<Reading>, RiskError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.clone())
    }

    fn sum_field_in_range(
        &self,
        field: ReadingField,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<f64>, RiskError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut matched = false;
        let mut sum = 0.0;
        for reading in rows.iter().filter(|r| r.timestamp >= start && r.timestamp <= end) {
            matched = true;
            sum += field.value_of(reading);
        }
        Ok(matched.then_some(sum))
    }
}
