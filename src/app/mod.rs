mod cli;
mod config;
mod error;
mod logging;
mod runtime;
pub mod services;

pub use config::{AppConfig, db_path_from_env};
pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    bootstrap()?;

    let config = AppConfig::from_env()?;

    tracing::info!(
        device_id = %config.device_id,
        base_url = %config.base_url,
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        http_timeout_ms = config.http_timeout_ms,
        history_window_secs = config.history_window_secs,
        cache_token = config.cache_token,
        "application bootstrap initialized"
    );

    runtime::run(config)
}

pub fn run_cli() -> Result<(), AppError> {
    bootstrap()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    cli::run(cli::parse_args(&args)?)
}

fn bootstrap() -> Result<(), AppError> {
    let dotenv = dotenvy::dotenv();
    logging::init()?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(error) if error.not_found() => {}
        Err(error) => tracing::warn!(error = %error, "failed to load environment file"),
    }

    Ok(())
}
