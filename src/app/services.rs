use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::models::{HourlyAverage, PowerSample, Reading};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error("database operation failed: {0}")]
    Database(#[from] DbError),
}

pub trait ReadingQueryHandler {
    fn power_history_since(&self, since_exclusive: i64) -> Result<Vec<PowerSample>, ServiceError>;
    fn hourly_power_averages_since(
        &self,
        since_exclusive: i64,
    ) -> Result<Vec<HourlyAverage>, ServiceError>;
    fn readings_newest_first(&self) -> Result<Vec<Reading>, ServiceError>;
    fn count_readings(&self) -> Result<i64, ServiceError>;
}

pub trait ReadingCommandHandler {
    /// Returns `false` when a reading for the same second already existed.
    fn insert_reading(&self, reading: &Reading) -> Result<bool, ServiceError>;
}

#[derive(Clone)]
pub struct SqliteReadingService {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteReadingService {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, ServiceError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| ServiceError::DbLockPoisoned)?;
        op(&connection).map_err(ServiceError::from)
    }
}

impl ReadingQueryHandler for SqliteReadingService {
    fn power_history_since(&self, since_exclusive: i64) -> Result<Vec<PowerSample>, ServiceError> {
        self.with_connection(|connection| db::list_power_history_since(connection, since_exclusive))
    }

    fn hourly_power_averages_since(
        &self,
        since_exclusive: i64,
    ) -> Result<Vec<HourlyAverage>, ServiceError> {
        self.with_connection(|connection| {
            db::hourly_power_averages_since(connection, since_exclusive)
        })
    }

    fn readings_newest_first(&self) -> Result<Vec<Reading>, ServiceError> {
        self.with_connection(db::list_readings_newest_first)
    }

    fn count_readings(&self) -> Result<i64, ServiceError> {
        self.with_connection(db::count_readings)
    }
}

impl ReadingCommandHandler for SqliteReadingService {
    fn insert_reading(&self, reading: &Reading) -> Result<bool, ServiceError> {
        self.with_connection(|connection| db::insert_reading(connection, reading))
    }
}
