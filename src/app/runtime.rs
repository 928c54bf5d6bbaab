use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::db;
use crate::adapters::tuya_cloud::{CloudCredentials, TuyaCloudClient};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::services::SqliteReadingService;
use crate::domain::clock::SystemClock;

const CORS_MAX_AGE_SECS: usize = 3600;

pub fn open_store(db_path: &str) -> Result<SqliteReadingService, AppError> {
    let mut connection = db::open_connection(db_path).map_err(AppError::database_init)?;
    db::run_migrations(&mut connection).map_err(AppError::database_init)?;

    Ok(SqliteReadingService::new(Arc::new(Mutex::new(connection))))
}

pub fn build_cloud_client(config: &AppConfig) -> Result<TuyaCloudClient<SystemClock>, AppError> {
    let credentials = CloudCredentials {
        access_id: config.access_id.clone(),
        access_secret: config.access_secret.clone(),
        device_id: config.device_id.clone(),
        base_url: config.base_url.clone(),
    };

    let client = TuyaCloudClient::new(
        credentials,
        Duration::from_millis(config.http_timeout_ms),
        SystemClock,
    )
    .map_err(AppError::runtime)?;

    Ok(if config.cache_token {
        client.with_token_cache()
    } else {
        client
    })
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let readings = open_store(&config.db_path)?;
    let cloud = build_cloud_client(&config)?;

    let api_state = ApiState {
        readings,
        cloud: Arc::new(cloud),
        clock: Arc::new(SystemClock),
        history_window_secs: config.history_window_secs,
    };

    tracing::info!(bind = %config.http_bind, "http server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                let cors = Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST"])
                    .allow_any_header()
                    .max_age(CORS_MAX_AGE_SECS);

                App::new()
                    .wrap(cors)
                    .app_data(web::Data::new(api_state.clone()))
                    .configure(configure_routes)
            })
            .bind(&config.http_bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}
