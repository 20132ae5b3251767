//! PostgreSQL-backed reading store.
//!
//! Readings live in a single append-only `sensor_readings` table. The
//! timestamp column is `TIMESTAMP(0)` so stored rows and query bounds share
//! second precision; otherwise a reading exactly on a window boundary could
//! fall outside a `BETWEEN` range.

use chrono::NaiveDateTime;
use postgres::{Client, NoTls, Row};
use std::sync::Mutex;

use super::{ReadingField, ReadingStore};
use crate::logging::{self, Component};
use crate::model::{Reading, RiskError, truncate_to_second};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS sensor_readings (
        id                 BIGSERIAL PRIMARY KEY,
        recorded_at        TIMESTAMP(0)     NOT NULL,
        sensor_id          TEXT             NOT NULL,
        water_level_cm     DOUBLE PRECISION NOT NULL,
        rain_rate_mm_per_h DOUBLE PRECISION NOT NULL,
        soil_humidity_pct  DOUBLE PRECISION NOT NULL,
        air_temp_c         DOUBLE PRECISION NOT NULL,
        air_humidity_pct   DOUBLE PRECISION NOT NULL
    )
";

const CREATE_INDEX: &str = "
    CREATE INDEX IF NOT EXISTS idx_sensor_readings_recorded_at
        ON sensor_readings (recorded_at)
";

const SELECT_COLUMNS: &str = "recorded_at, sensor_id, water_level_cm, rain_rate_mm_per_h, \
                              soil_humidity_pct, air_temp_c, air_humidity_pct";

pub struct PostgresStore {
    client: Mutex<Client>,
}

impl PostgresStore {
    /// Connects to the database at `database_url`.
    pub fn connect(database_url: &str) -> Result<Self, RiskError> {
        let client = Client::connect(database_url, NoTls).map_err(|e| {
            logging::log_store_failure("connect", &e);
            RiskError::StoreUnavailable(e.to_string())
        })?;
        logging::debug(Component::Store, None, "Connected to PostgreSQL");
        Ok(PostgresStore {
            client: Mutex::new(client),
        })
    }

    /// Wraps an already-connected client.
    pub fn from_client(client: Client) -> Self {
        PostgresStore {
            client: Mutex::new(client),
        }
    }

    fn with_client<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Client) -> Result<T, postgres::Error>,
    ) -> Result<T, RiskError> {
        let mut client = self.client.lock().map_err(|_| {
            RiskError::StoreUnavailable(format!("{}: client lock poisoned", operation))
        })?;
        f(&mut client).map_err(|e| {
            logging::log_store_failure(operation, &e);
            RiskError::StoreUnavailable(format!("{}: {}", operation, e))
        })
    }

    /// Creates the readings table and its timestamp index (idempotent).
    pub fn create_schema(&self) -> Result<(), RiskError> {
        self.with_client("create_schema", |client| {
            let mut tx = client.transaction()?;
            tx.batch_execute(CREATE_TABLE)?;
            tx.batch_execute(CREATE_INDEX)?;
            tx.commit()
        })?;
        logging::info(Component::Store, None, "Table sensor_readings ready");
        Ok(())
    }

    /// Appends one reading after validating it. The timestamp is truncated
    /// here; `TIMESTAMP(0)` on its own would round to the nearest second.
    pub fn insert_reading(&self, reading: &Reading) -> Result<(), RiskError> {
        reading.validate()?;
        let recorded_at = truncate_to_second(reading.timestamp);
        self.with_client("insert_reading", |client| {
            client.execute(
                "INSERT INTO sensor_readings (recorded_at, sensor_id, water_level_cm, \
                 rain_rate_mm_per_h, soil_humidity_pct, air_temp_c, air_humidity_pct) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &recorded_at,
                    &reading.sensor_id,
                    &reading.water_level_cm,
                    &reading.rain_rate_mm_per_h,
                    &reading.soil_humidity_pct,
                    &reading.air_temp_c,
                    &reading.air_humidity_pct,
                ],
            )
        })?;
        Ok(())
    }

    /// Most recent reading, if any.
    pub fn latest_reading(&self) -> Result<Option<Reading>, RiskError> {
        let query = format!(
            "SELECT {} FROM sensor_readings ORDER BY recorded_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = self.with_client("latest_reading", |client| {
            client.query_opt(query.as_str(), &[])
        })?;
        row.map(|r| reading_from_row(&r)).transpose()
    }

    /// Readings with `start <= recorded_at <= end`, ascending.
    pub fn readings_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reading>, RiskError> {
        let query = format!(
            "SELECT {} FROM sensor_readings WHERE recorded_at BETWEEN $1 AND $2 \
             ORDER BY recorded_at ASC, id ASC",
            SELECT_COLUMNS
        );
        let rows = self.with_client("readings_between", |client| {
            client.query(query.as_str(), &[&start, &end])
        })?;
        rows.iter().map(reading_from_row).collect()
    }
}

impl ReadingStore for PostgresStore {
    fn all_readings(&self) -> Result<Vec<Reading>, RiskError> {
        let query = format!(
            "SELECT {} FROM sensor_readings ORDER BY recorded_at ASC, id ASC",
            SELECT_COLUMNS
        );
        let rows = self.with_client("all_readings", |client| client.query(query.as_str(), &[]))?;
        rows.iter().map(reading_from_row).collect()
    }

    fn sum_field_in_range(
        &self,
        field: ReadingField,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<f64>, RiskError> {
        // Column names come from a closed enum, never from input.
        let query = format!(
            "SELECT SUM({}) FROM sensor_readings WHERE recorded_at BETWEEN $1 AND $2",
            field.column()
        );
        let row = self.with_client("sum_field_in_range", |client| {
            client.query_one(query.as_str(), &[&start, &end])
        })?;
        row.try_get::<_, Option<f64>>(0)
            .map_err(|e| RiskError::StoreUnavailable(format!("sum_field_in_range: {}", e)))
    }
}

fn reading_from_row(row: &Row) -> Result<Reading, RiskError> {
    let decode = |e: postgres::Error| RiskError::MalformedReading(format!("stored row: {}", e));
    Ok(Reading {
        timestamp: row.try_get(0).map_err(decode)?,
        sensor_id: row.try_get(1).map_err(decode)?,
        water_level_cm: row.try_get(2).map_err(decode)?,
        rain_rate_mm_per_h: row.try_get(3).map_err(decode)?,
        soil_humidity_pct: row.try_get(4).map_err(decode)?,
        air_temp_c: row.try_get(5).map_err(decode)?,
        air_humidity_pct: row.try_get(6).map_err(decode)?,
    })
}
