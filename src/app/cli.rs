use std::path::PathBuf;

use crate::adapters::csv_export::render_readings_csv;
use crate::app::config::{AppConfig, db_path_from_env};
use crate::app::error::AppError;
use crate::app::runtime::{build_cloud_client, open_store};
use crate::app::services::ReadingQueryHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Status,
    Switch { on: bool },
    Export { out: Option<PathBuf> },
    Help,
}

pub fn parse_args(args: &[String]) -> Result<CliCommand, AppError> {
    let Some(command) = args.first() else {
        return Ok(CliCommand::Help);
    };

    match command.as_str() {
        "status" => expect_no_more(args, 1).map(|()| CliCommand::Status),
        "switch" => {
            let on = match args.get(1).map(String::as_str) {
                Some("on") => true,
                Some("off") => false,
                Some(other) => {
                    return Err(AppError::usage(format!(
                        "switch expects `on` or `off`, got `{other}`"
                    )));
                }
                None => return Err(AppError::usage("switch requires `on` or `off`")),
            };
            expect_no_more(args, 2)?;
            Ok(CliCommand::Switch { on })
        }
        "export" => {
            let mut out = None;
            let mut index = 1;
            while index < args.len() {
                match args[index].as_str() {
                    "--out" => {
                        let Some(value) = args.get(index + 1) else {
                            return Err(AppError::usage("--out requires a value"));
                        };
                        out = Some(PathBuf::from(value));
                        index += 2;
                    }
                    other => return Err(AppError::usage(format!("unknown argument: {other}"))),
                }
            }
            Ok(CliCommand::Export { out })
        }
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        other => Err(AppError::usage(format!("unknown command: {other}"))),
    }
}

fn expect_no_more(args: &[String], consumed: usize) -> Result<(), AppError> {
    match args.get(consumed) {
        Some(extra) => Err(AppError::usage(format!("unexpected argument: {extra}"))),
        None => Ok(()),
    }
}

pub fn run(command: CliCommand) -> Result<(), AppError> {
    match command {
        CliCommand::Status => {
            let config = AppConfig::from_env()?;
            let client = build_cloud_client(&config)?;
            let status = actix_web::rt::System::new()
                .block_on(client.get_device_status())
                .map_err(AppError::runtime)?;

            let rendered = serde_json::to_string_pretty(&status).map_err(AppError::runtime)?;
            println!("{rendered}");
        }
        CliCommand::Switch { on } => {
            let config = AppConfig::from_env()?;
            let client = build_cloud_client(&config)?;
            let success = actix_web::rt::System::new()
                .block_on(client.send_switch_command(on))
                .map_err(AppError::runtime)?;

            println!("{}", serde_json::json!({ "success": success }));
        }
        CliCommand::Export { out } => {
            let store = open_store(&db_path_from_env())?;
            let readings = store.readings_newest_first().map_err(AppError::runtime)?;
            let csv = render_readings_csv(&readings);

            match out {
                Some(path) => {
                    std::fs::write(&path, csv).map_err(AppError::runtime)?;
                    tracing::info!(
                        path = %path.display(),
                        rows = readings.len(),
                        "readings exported"
                    );
                }
                None => print!("{csv}"),
            }
        }
        CliCommand::Help => print_help(),
    }

    Ok(())
}

fn print_help() {
    println!("plug_cli");
    println!();
    println!("Usage:");
    println!("  plug_cli status                 read and decode the plug status");
    println!("  plug_cli switch <on|off>        send a switch command");
    println!("  plug_cli export [--out <file>]  write stored readings as CSV");
    println!();
    println!("Reads TUYA_ACCESS_ID, TUYA_ACCESS_SECRET, TUYA_DEVICE_ID, TUYA_BASE_URL");
    println!("and DB_PATH from the environment or a .env file.");
}
