//! Trailing rainfall aggregation.
//!
//! The 24h figure is the plain sum of the rain-rate samples recorded in the
//! window `[end - 24h, end]`, both ends inclusive. It is not a time integral
//! of the rate: the critical threshold is expressed against this sum.

use chrono::{Duration, NaiveDateTime};

use crate::model::{RiskError, truncate_to_second};
use crate::store::{ReadingField, ReadingStore};

/// Length of the accumulation window used by the override rules.
pub const RAIN_WINDOW_HOURS: i64 = 24;

/// Sum of rain-rate samples in `[end - window, end]`. No rows counts as 0.0.
pub fn accumulated_rain(
    store: &dyn ReadingStore,
    end: NaiveDateTime,
    window: Duration,
) -> Result<f64, RiskError> {
    let end = truncate_to_second(end);
    let start = end - window;
    let sum = store.sum_field_in_range(ReadingField::RainRate, start, end)?;
    Ok(sum.unwrap_or(0.0))
}

/// Sum of rain-rate samples over the 24 hours ending at `end`.
pub fn accumulated_rain_24h(
    store: &dyn ReadingStore,
    end: NaiveDateTime,
) -> Result<f64, RiskError> {
    accumulated_rain(store, end, Duration::hours(RAIN_WINDOW_HOURS))
}
