use serde::{Deserialize, Serialize};

/// One persisted sample, keyed by its unix timestamp in seconds.
///
/// Values are optional because rows written by earlier tools may hold NULL
/// cells; they are carried through as `None` rather than read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: i64,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    pub timestamp: i64,
    pub power: Option<f64>,
}

/// `avg_power` is `None` when every reading of the hour has a NULL power.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyAverage {
    pub hour: String,
    pub avg_power: Option<f64>,
}
