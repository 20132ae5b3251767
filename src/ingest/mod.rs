/// Ingestion helpers for the sensor feed.
///
/// Transport is out of scope here; this module only turns a received
/// payload into a validated `Reading` that can be appended to the store.
///
/// Submodules:
/// - `payload`: JSON payload parsing and format validation.

pub mod payload;
