/// Sensor feed payload parsing
///
/// The field device publishes one flat JSON object per sample:
///
/// ```json
/// {"water_level_cm":281.40,"rain_mm_hour":12.07,"soil_humidity_pct":88.10,
///  "temp_c":24.55,"humidity_air_pct":91.32}
/// ```
///
/// The payload carries no timestamp or device id; the receiver stamps both.
/// Values may arrive as JSON numbers or numeric strings. Anything else is a
/// `MalformedReading`, never a silent zero.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::model::{Reading, RiskError};

/// Payload keys, in `Reading` feature order.
pub const PAYLOAD_KEYS: [&str; 5] = [
    "water_level_cm",
    "rain_mm_hour",
    "soil_humidity_pct",
    "temp_c",
    "humidity_air_pct",
];

/// Parses one feed payload into a `Reading` stamped with `received_at`.
pub fn parse_payload(
    payload: &str,
    sensor_id: &str,
    received_at: NaiveDateTime,
) -> Result<Reading, RiskError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| RiskError::MalformedReading(format!("payload is not valid JSON: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        RiskError::MalformedReading("payload must be a JSON object".to_string())
    })?;

    let mut values = [0.0; 5];
    for (slot, key) in values.iter_mut().zip(PAYLOAD_KEYS) {
        *slot = numeric_field(object.get(key), key)?;
    }
    let [water_level_cm, rain_rate_mm_per_h, soil_humidity_pct, air_temp_c, air_humidity_pct] =
        values;

    let reading = Reading::new(
        received_at,
        sensor_id,
        water_level_cm,
        rain_rate_mm_per_h,
        soil_humidity_pct,
        air_temp_c,
        air_humidity_pct,
    );
    reading.validate()?;
    Ok(reading)
}

fn numeric_field(value: Option<&Value>, key: &str) -> Result<f64, RiskError> {
    match value {
        None | Some(Value::Null) => Err(RiskError::MalformedReading(format!(
            "missing required field '{}'",
            key
        ))),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            RiskError::MalformedReading(format!("field '{}' is not representable as f64", key))
        }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            RiskError::MalformedReading(format!("field '{}' is not numeric: {:?}", key, s))
        }),
        Some(other) => Err(RiskError::MalformedReading(format!(
            "field '{}' is not numeric: {}",
            key, other
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
