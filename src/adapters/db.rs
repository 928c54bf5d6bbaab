use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::domain::models::{HourlyAverage, PowerSample, Reading};

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS readings (
    ts INTEGER PRIMARY KEY,
    voltage REAL,
    current REAL,
    power REAL
);
"#,
)];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::from)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Stores a reading unless one already exists for the same second.
///
/// Returns `true` when a row was written, `false` when the timestamp was
/// already taken and the existing row was kept.
pub fn insert_reading(connection: &Connection, reading: &Reading) -> Result<bool, DbError> {
    let changed = connection.execute(
        "INSERT OR IGNORE INTO readings (ts, voltage, current, power) VALUES (?1, ?2, ?3, ?4)",
        params![
            reading.timestamp,
            reading.voltage,
            reading.current,
            reading.power,
        ],
    )?;

    Ok(changed > 0)
}

pub fn get_reading(connection: &Connection, timestamp: i64) -> Result<Option<Reading>, DbError> {
    let reading = connection
        .query_row(
            "SELECT ts, voltage, current, power FROM readings WHERE ts = ?1",
            params![timestamp],
            map_reading,
        )
        .optional()?;

    Ok(reading)
}

pub fn count_readings(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn list_power_history_since(
    connection: &Connection,
    since_exclusive: i64,
) -> Result<Vec<PowerSample>, DbError> {
    let mut statement = connection.prepare(
        "SELECT ts, power
         FROM readings
         WHERE ts > ?1
         ORDER BY ts",
    )?;

    let rows = statement.query_map(params![since_exclusive], |row| {
        Ok(PowerSample {
            timestamp: row.get(0)?,
            power: row.get(1)?,
        })
    })?;

    let mut samples = Vec::new();
    for row in rows {
        samples.push(row?);
    }

    Ok(samples)
}

pub fn hourly_power_averages_since(
    connection: &Connection,
    since_exclusive: i64,
) -> Result<Vec<HourlyAverage>, DbError> {
    let mut statement = connection.prepare(
        "SELECT
            strftime('%Y-%m-%d %H:00:00', datetime(ts, 'unixepoch')) AS hour,
            AVG(power) AS avg_power
         FROM readings
         WHERE ts > ?1
         GROUP BY hour
         ORDER BY hour",
    )?;

    let rows = statement.query_map(params![since_exclusive], |row| {
        Ok(HourlyAverage {
            hour: row.get(0)?,
            avg_power: row.get(1)?,
        })
    })?;

    let mut averages = Vec::new();
    for row in rows {
        averages.push(row?);
    }

    Ok(averages)
}

pub fn list_readings_newest_first(connection: &Connection) -> Result<Vec<Reading>, DbError> {
    let mut statement = connection.prepare(
        "SELECT ts, voltage, current, power
         FROM readings
         ORDER BY ts DESC",
    )?;

    let rows = statement.query_map([], map_reading)?;

    let mut readings = Vec::new();
    for row in rows {
        readings.push(row?);
    }

    Ok(readings)
}

fn map_reading(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reading> {
    Ok(Reading {
        timestamp: row.get(0)?,
        voltage: row.get(1)?,
        current: row.get(2)?,
        power: row.get(3)?,
    })
}
