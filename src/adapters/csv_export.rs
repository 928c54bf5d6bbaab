use chrono::DateTime;

use crate::domain::models::Reading;

pub const CSV_HEADER: &str = "Date-Time,Voltage(V),Current(A),Power(W)";
pub const CSV_FILENAME: &str = "power_24h.csv";

const LINE_END: &str = "\r\n";

/// Renders readings as CSV in the order given, one row per reading.
///
/// A missing value leaves its cell empty.
pub fn render_readings_csv(readings: &[Reading]) -> String {
    let mut output = String::with_capacity((readings.len() + 1) * 48);
    output.push_str(CSV_HEADER);
    output.push_str(LINE_END);

    for reading in readings {
        output.push_str(&format!(
            "{},{},{},{}{LINE_END}",
            format_datetime(reading.timestamp),
            format_cell(reading.voltage),
            format_cell(reading.current),
            format_cell(reading.power)
        ));
    }

    output
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|value| format!("{value:?}")).unwrap_or_default()
}

fn format_datetime(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
