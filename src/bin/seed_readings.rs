use plug_dashboard::adapters::db::{count_readings, insert_reading, open_connection, run_migrations};
use plug_dashboard::app::{AppError, db_path_from_env};
use plug_dashboard::domain::clock::{Clock, SystemClock};
use plug_dashboard::domain::models::Reading;

const SAMPLE_INTERVAL_SECS: usize = 60;

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to seed readings: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let mut path = db_path_from_env();
    let mut hours: i64 = 24;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err(AppError::usage("--path requires a value"));
                };
                path = value.clone();
                index += 2;
            }
            "--hours" => {
                hours = args
                    .get(index + 1)
                    .and_then(|value| value.parse::<i64>().ok())
                    .filter(|value| (1..=24 * 365).contains(value))
                    .ok_or_else(|| AppError::usage("--hours requires a number from 1 to 8760"))?;
                index += 2;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(AppError::usage(format!("unknown argument: {other}")));
            }
        }
    }

    let mut connection = open_connection(&path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;

    let end = SystemClock.now().as_unix_seconds();
    let mut inserted = 0_usize;
    for reading in sample_readings(end, hours) {
        if insert_reading(&connection, &reading).map_err(AppError::runtime)? {
            inserted += 1;
        }
    }
    let total = count_readings(&connection).map_err(AppError::runtime)?;

    println!("seeded reading db at: {path}");
    println!("new readings: {inserted}");
    println!("stored readings: {total}");
    Ok(())
}

/// One reading per minute for the `hours` ending at `end`, oldest first.
fn sample_readings(end: i64, hours: i64) -> Vec<Reading> {
    let start = end - hours * 3600;
    (start + SAMPLE_INTERVAL_SECS as i64..=end)
        .step_by(SAMPLE_INTERVAL_SECS)
        .map(sample_reading)
        .collect()
}

// Standby load with a one-hour heater burst from 18:00 UTC.
fn sample_reading(timestamp: i64) -> Reading {
    let minute_of_day = timestamp.rem_euclid(86_400) / 60;
    let power = if (18 * 60..19 * 60).contains(&minute_of_day) {
        1_800.0
    } else {
        35.0 + (minute_of_day % 15) as f64
    };
    let voltage = 229.0 + (minute_of_day % 7) as f64 * 0.3;
    let current = (power / voltage * 1000.0).round() / 1000.0;

    Reading {
        timestamp,
        voltage: Some(voltage),
        current: Some(current),
        power: Some(power),
    }
}

fn print_help() {
    println!("seed_readings");
    println!();
    println!("Usage:");
    println!("  cargo run --bin seed_readings -- [--path <file>] [--hours <n>]");
    println!();
    println!("Options:");
    println!("  --path <file>   target sqlite file (default: DB_PATH or power.db)");
    println!("  --hours <n>     hours of per-minute readings ending now (default: 24)");
    println!();
    println!("Existing readings are kept; seeding the same seconds twice adds nothing.");
}
