/// Reading staleness detection.
///
/// The field device publishes every few seconds under normal operation. A
/// latest reading that is much older than that means the feed has stopped,
/// and an analysis of it describes the past, not the present. The CLI uses
/// this to flag old results.
///
/// # Clock injection
/// `is_stale_at` takes `now` as a parameter rather than reading the clock,
/// which keeps the check deterministic in tests.

use chrono::{Local, NaiveDateTime};

use crate::model::Reading;

/// Default age, in minutes, past which the latest reading is flagged.
pub const DEFAULT_MAX_AGE_MINUTES: u64 = 30;

/// Age of `reading` in whole minutes at `now`. Readings stamped in the future
/// count as age 0.
pub fn age_minutes_at(reading: &Reading, now: NaiveDateTime) -> u64 {
    let minutes = (now - reading.timestamp).num_minutes();
    u64::try_from(minutes).unwrap_or(0)
}

/// Returns `true` if the reading is older than `max_age_minutes` at `now`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
pub fn is_stale_at(reading: &Reading, max_age_minutes: u64, now: NaiveDateTime) -> bool {
    age_minutes_at(reading, now) > max_age_minutes
}

/// Convenience wrapper that uses the local wall clock, matching the naive
/// local timestamps the receiver stamps readings with.
pub fn is_stale(reading: &Reading, max_age_minutes: u64) -> bool {
    is_stale_at(reading, max_age_minutes, Local::now().naive_local())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
