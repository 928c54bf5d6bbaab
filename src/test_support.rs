use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::TempDir;

use crate::adapters::db::{insert_reading, open_connection, run_migrations};
use crate::domain::models::Reading;

/// A reading database in its own temporary directory, removed on drop.
pub struct TestDb {
    pub connection: Connection,
    dir: TempDir,
}

impl TestDb {
    /// Opens a database file without running migrations.
    pub fn empty(test_name: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{test_name}-"))
            .tempdir()
            .expect("test db dir should be creatable");
        let path = dir.path().join("readings.sqlite");
        let connection =
            open_connection(path.to_string_lossy().as_ref()).expect("test db should open");

        Self { connection, dir }
    }

    pub fn migrated(test_name: &str) -> Self {
        let mut db = Self::empty(test_name);
        run_migrations(&mut db.connection).expect("test db migrations should succeed");
        db
    }

    /// Hands the connection over for sharing; the directory must outlive it.
    pub fn into_shared(self) -> (Arc<Mutex<Connection>>, TempDir) {
        (Arc::new(Mutex::new(self.connection)), self.dir)
    }
}

/// A complete reading at 230 V and 0.1 A with the given power.
pub fn sample_reading(timestamp: i64, power: f64) -> Reading {
    Reading {
        timestamp,
        voltage: Some(230.0),
        current: Some(0.1),
        power: Some(power),
    }
}

pub fn seed_readings(connection: &Connection, readings: &[Reading]) {
    for reading in readings {
        insert_reading(connection, reading).expect("seed reading should be inserted");
    }
}
