use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SWITCH_CODE: &str = "switch_1";
pub const VOLTAGE_CODE: &str = "cur_voltage";
pub const CURRENT_CODE: &str = "cur_current";
pub const POWER_CODE: &str = "cur_power";

// Raw units reported by the plug: decivolts and milliamps, power already in watts.
const VOLTAGE_DIVISOR: f64 = 10.0;
const CURRENT_DIVISOR: f64 = 1000.0;

/// One `{code, value}` data point from the device status list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatusEntry {
    pub code: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub switch_on: bool,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

/// Decodes the four telemetry values from a device status list.
///
/// Each code is looked up independently; the first entry carrying a code
/// wins even if a later entry repeats it. Absent codes, or values of the
/// wrong JSON type, fall back to `false` / `0`.
pub fn decode_status(entries: &[StatusEntry]) -> DeviceStatus {
    let switch_on = first_value(entries, SWITCH_CODE)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let voltage = first_number(entries, VOLTAGE_CODE).map_or(0.0, |raw| raw / VOLTAGE_DIVISOR);
    let current = first_number(entries, CURRENT_CODE).map_or(0.0, |raw| raw / CURRENT_DIVISOR);
    let power = first_number(entries, POWER_CODE).unwrap_or(0.0);

    for code in [SWITCH_CODE, VOLTAGE_CODE, CURRENT_CODE, POWER_CODE] {
        if first_value(entries, code).is_none() {
            tracing::debug!(code, "status code missing from device report, using default");
        }
    }

    DeviceStatus {
        switch_on,
        voltage,
        current,
        power,
    }
}

fn first_value<'a>(entries: &'a [StatusEntry], code: &str) -> Option<&'a Value> {
    for entry in entries {
        if entry.code == code {
            return Some(&entry.value);
        }
    }
    None
}

fn first_number(entries: &[StatusEntry], code: &str) -> Option<f64> {
    first_value(entries, code).and_then(Value::as_f64)
}
