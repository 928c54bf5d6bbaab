use std::sync::Arc;

use actix_web::http::header::CONTENT_DISPOSITION;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

use crate::adapters::csv_export::{CSV_FILENAME, render_readings_csv};
use crate::adapters::tuya_cloud::{CloudError, DeviceCloud};
use crate::app::services::{
    ReadingCommandHandler, ReadingQueryHandler, ServiceError, SqliteReadingService,
};
use crate::domain::clock::Clock;
use crate::domain::models::Reading;

#[derive(Clone)]
pub struct ApiState {
    pub readings: SqliteReadingService,
    pub cloud: Arc<dyn DeviceCloud>,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub history_window_secs: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HistoryPointResponse {
    pub x: i64,
    pub y: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LiveResponse {
    #[serde(rename = "switch")]
    pub switch_on: bool,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub history: Vec<HistoryPointResponse>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HourlyAverageResponse {
    pub hour: String,
    pub avg_power: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    #[serde(default)]
    pub on: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveReadingRequest {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(live_endpoint)
        .service(hourly_endpoint)
        .service(switch_endpoint)
        .service(save_endpoint)
        .service(download_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Reads the plug, stores the sample for the current second and returns it
/// together with the power history of the configured window.
#[get("/api/live")]
async fn live_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let status = match state.cloud.read_status().await {
        Ok(status) => status,
        Err(error) => return cloud_error_response(error),
    };

    let now = state.clock.now().as_unix_seconds();
    let reading = Reading {
        timestamp: now,
        voltage: Some(status.voltage),
        current: Some(status.current),
        power: Some(status.power),
    };

    match state.readings.insert_reading(&reading) {
        Ok(true) => {}
        Ok(false) => tracing::debug!(ts = now, "reading for this second already stored"),
        Err(error) => return service_error_response(error),
    }

    let history = match state
        .readings
        .power_history_since(now - state.history_window_secs)
    {
        Ok(samples) => samples
            .into_iter()
            .map(|sample| HistoryPointResponse {
                x: sample.timestamp * 1000,
                y: sample.power,
            })
            .collect(),
        Err(error) => return service_error_response(error),
    };

    HttpResponse::Ok().json(LiveResponse {
        switch_on: status.switch_on,
        voltage: status.voltage,
        current: status.current,
        power: status.power,
        history,
    })
}

#[get("/api/hourly")]
async fn hourly_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let since = state.clock.now().as_unix_seconds() - state.history_window_secs;

    match state.readings.hourly_power_averages_since(since) {
        Ok(averages) => {
            let mapped: Vec<HourlyAverageResponse> = averages
                .into_iter()
                .map(|average| HourlyAverageResponse {
                    hour: average.hour,
                    avg_power: average.avg_power,
                })
                .collect();

            HttpResponse::Ok().json(mapped)
        }
        Err(error) => service_error_response(error),
    }
}

#[post("/switch")]
async fn switch_endpoint(
    state: web::Data<ApiState>,
    request: web::Json<SwitchRequest>,
) -> impl Responder {
    match state.cloud.set_switch(request.on).await {
        Ok(success) => HttpResponse::Ok().json(serde_json::json!({ "success": success })),
        Err(error) => cloud_error_response(error),
    }
}

#[post("/save")]
async fn save_endpoint(
    state: web::Data<ApiState>,
    request: web::Json<SaveReadingRequest>,
) -> impl Responder {
    let reading = Reading {
        timestamp: state.clock.now().as_unix_seconds(),
        voltage: Some(request.voltage),
        current: Some(request.current),
        power: Some(request.power),
    };

    match state.readings.insert_reading(&reading) {
        Ok(inserted) => {
            tracing::info!(ts = reading.timestamp, inserted, "manual reading saved");
            HttpResponse::Ok().json(serde_json::json!({ "saved": true }))
        }
        Err(error) => service_error_response(error),
    }
}

#[get("/download")]
async fn download_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.readings.readings_newest_first() {
        Ok(readings) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                CONTENT_DISPOSITION,
                format!("attachment;filename={CSV_FILENAME}"),
            ))
            .body(render_readings_csv(&readings)),
        Err(error) => service_error_response(error),
    }
}

fn cloud_error_response(error: CloudError) -> HttpResponse {
    tracing::warn!(error = %error, "device cloud call failed");
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": error.to_string()
    }))
}

fn service_error_response(error: ServiceError) -> HttpResponse {
    match error {
        ServiceError::DbLockPoisoned => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "database lock poisoned"
            }))
        }
        ServiceError::Database(error) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("database query failed: {error}")
            }))
        }
    }
}
