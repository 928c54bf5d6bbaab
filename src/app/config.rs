use crate::app::AppError;

pub const DEFAULT_BASE_URL: &str = "https://openapi.tuyain.com";
pub const DEFAULT_DB_PATH: &str = "power.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub access_id: String,
    pub access_secret: String,
    pub device_id: String,
    pub base_url: String,
    pub db_path: String,
    pub http_bind: String,
    pub http_timeout_ms: u64,
    pub history_window_secs: i64,
    pub cache_token: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            access_id: required(&lookup, "TUYA_ACCESS_ID")?,
            access_secret: required(&lookup, "TUYA_ACCESS_SECRET")?,
            device_id: required(&lookup, "TUYA_DEVICE_ID")?,
            base_url: optional(&lookup, "TUYA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            db_path: db_path(&lookup),
            http_bind: optional(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "127.0.0.1:5000".to_string()),
            http_timeout_ms: parse_or_default(&lookup, "HTTP_TIMEOUT_MS", 10_000_u64)?,
            history_window_secs: history_window_secs(&lookup)?,
            cache_token: parse_flag_or_default(&lookup, "TUYA_CACHE_TOKEN", false)?,
        })
    }
}

/// Database location alone, for commands that never talk to the cloud.
pub fn db_path_from_env() -> String {
    db_path(&|key: &str| std::env::var(key).ok())
}

fn db_path<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, "DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
}

fn history_window_secs<F>(lookup: &F) -> Result<i64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_or_default(lookup, "HISTORY_WINDOW_SECS", 86_400_i64)?;
    if secs <= 0 {
        return Err(AppError::config("HISTORY_WINDOW_SECS must be a positive number"));
    }
    Ok(secs)
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| AppError::config(format!("{key} is required")))
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}

fn parse_flag_or_default<F>(lookup: &F, key: &str, default: bool) -> Result<bool, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!("{key} must be a valid boolean"))),
        },
        None => Ok(default),
    }
}
