use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::clock::{Clock, TimestampMs};
use crate::domain::device_status::{DeviceStatus, SWITCH_CODE, StatusEntry, decode_status};
use crate::domain::signature::{HttpMethod, SIGN_METHOD, SignedRequest, Signer};

pub const TOKEN_PATH: &str = "/v1.0/token?grant_type=1";

// A cached token is dropped this long before the cloud would expire it.
const TOKEN_REFRESH_MARGIN_MS: i64 = 60_000;

/// Static access parameters for one device on the vendor cloud.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    pub access_id: String,
    pub access_secret: String,
    pub device_id: String,
    pub base_url: String,
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("token grant rejected with HTTP status {status}")]
    RemoteAuth { status: u16 },
    #[error("device request rejected with HTTP status {status}")]
    RemoteQuery { status: u16 },
    #[error("malformed cloud response: {0}")]
    MalformedResponse(String),
    #[error("cloud request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to build cloud http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl CloudError {
    fn missing_field(field: &str, remote_message: Option<&str>) -> Self {
        match remote_message {
            Some(message) => Self::MalformedResponse(format!("missing {field} ({message})")),
            None => Self::MalformedResponse(format!("missing {field}")),
        }
    }
}

/// Operations the dashboard needs from the device cloud.
#[async_trait]
pub trait DeviceCloud: Send + Sync {
    async fn read_status(&self) -> Result<DeviceStatus, CloudError>;

    /// Returns whether the cloud accepted the command (HTTP 200). Acceptance
    /// says nothing about whether the plug actually switched.
    async fn set_switch(&self, on: bool) -> Result<bool, CloudError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Option<TimestampMs>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResult {
    access_token: Option<String>,
    expire_time: Option<i64>,
}

pub struct TuyaCloudClient<C> {
    http: Client,
    credentials: CloudCredentials,
    signer: Signer,
    clock: C,
    token_cache: Option<Mutex<Option<AccessToken>>>,
}

impl<C> TuyaCloudClient<C>
where
    C: Clock + Send + Sync,
{
    pub fn new(
        credentials: CloudCredentials,
        timeout: Duration,
        clock: C,
    ) -> Result<Self, CloudError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CloudError::ClientBuild)?;
        let signer = Signer::new(&credentials.access_id, &credentials.access_secret);

        Ok(Self {
            http,
            credentials,
            signer,
            clock,
            token_cache: None,
        })
    }

    /// Reuses access tokens until shortly before their remote expiry instead
    /// of granting a new one for every call.
    pub fn with_token_cache(mut self) -> Self {
        self.token_cache = Some(Mutex::new(None));
        self
    }

    pub fn device_id(&self) -> &str {
        &self.credentials.device_id
    }

    pub async fn fetch_token(&self) -> Result<AccessToken, CloudError> {
        let signed = self
            .signer
            .sign(&self.clock, HttpMethod::Get, TOKEN_PATH, "", None);
        let response = self
            .signed(self.http.get(self.url(TOKEN_PATH)), &signed, None)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloudError::RemoteAuth {
                status: status.as_u16(),
            });
        }

        let Envelope { result, msg } = read_envelope::<TokenResult>(response).await?;
        let Some(TokenResult {
            access_token: Some(value),
            expire_time,
        }) = result
        else {
            return Err(CloudError::missing_field("result.access_token", msg.as_deref()));
        };

        let issued_at = self.clock.now();
        let expires_at = match expire_time {
            Some(seconds) => {
                let lifetime_ms = seconds.checked_mul(1000).ok_or_else(|| {
                    CloudError::MalformedResponse(format!(
                        "result.expire_time out of range: {seconds}"
                    ))
                })?;
                Some(TimestampMs(issued_at.0.saturating_add(lifetime_ms)))
            }
            None => None,
        };

        tracing::debug!(expire_time_s = ?expire_time, "access token granted");

        Ok(AccessToken { value, expires_at })
    }

    pub async fn get_device_status(&self) -> Result<DeviceStatus, CloudError> {
        let token = self.token().await?;
        let path = self.status_path();
        let signed = self
            .signer
            .sign(&self.clock, HttpMethod::Get, &path, "", Some(&token));
        let response = self
            .signed(self.http.get(self.url(&path)), &signed, Some(&token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloudError::RemoteQuery {
                status: status.as_u16(),
            });
        }

        let Envelope { result, msg } = read_envelope::<Vec<StatusEntry>>(response).await?;
        let entries = result.ok_or_else(|| CloudError::missing_field("result", msg.as_deref()))?;
        let decoded = decode_status(&entries);

        tracing::debug!(
            device_id = %self.credentials.device_id,
            switch_on = decoded.switch_on,
            voltage = decoded.voltage,
            current = decoded.current,
            power = decoded.power,
            "device status decoded"
        );

        Ok(decoded)
    }

    pub async fn send_switch_command(&self, on: bool) -> Result<bool, CloudError> {
        let token = self.token().await?;
        let path = self.commands_path();
        let body = serde_json::json!({
            "commands": [{ "code": SWITCH_CODE, "value": on }]
        })
        .to_string();
        let signed = self
            .signer
            .sign(&self.clock, HttpMethod::Post, &path, &body, Some(&token));

        let response = self
            .signed(self.http.post(self.url(&path)), &signed, Some(&token))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let accepted = status == StatusCode::OK;
        if accepted {
            tracing::info!(device_id = %self.credentials.device_id, on, "switch command accepted");
        } else {
            tracing::warn!(
                device_id = %self.credentials.device_id,
                on,
                status = status.as_u16(),
                "switch command rejected"
            );
        }

        Ok(accepted)
    }

    async fn token(&self) -> Result<String, CloudError> {
        if let Some(value) = self.cached_token() {
            return Ok(value);
        }

        let token = self.fetch_token().await?;
        self.store_token(&token);
        Ok(token.value)
    }

    fn cached_token(&self) -> Option<String> {
        let cache = self.token_cache.as_ref()?;
        let guard = cache.lock().ok()?;
        let cached = guard.as_ref()?;
        let expires_at = cached.expires_at?;

        if expires_at.0.saturating_sub(TOKEN_REFRESH_MARGIN_MS) > self.clock.now().0 {
            Some(cached.value.clone())
        } else {
            None
        }
    }

    fn store_token(&self, token: &AccessToken) {
        if let Some(cache) = &self.token_cache
            && let Ok(mut guard) = cache.lock()
        {
            *guard = Some(token.clone());
        }
    }

    fn signed(
        &self,
        builder: RequestBuilder,
        signed: &SignedRequest,
        token: Option<&str>,
    ) -> RequestBuilder {
        let builder = builder
            .header("client_id", self.signer.access_id())
            .header("sign", &signed.signature)
            .header("t", &signed.timestamp)
            .header("sign_method", SIGN_METHOD);

        match token {
            Some(token) => builder.header("access_token", token),
            None => builder,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.credentials.base_url.trim_end_matches('/'))
    }

    fn status_path(&self) -> String {
        format!("/v1.0/devices/{}/status", self.credentials.device_id)
    }

    fn commands_path(&self) -> String {
        format!("/v1.0/devices/{}/commands", self.credentials.device_id)
    }
}

#[async_trait]
impl<C> DeviceCloud for TuyaCloudClient<C>
where
    C: Clock + Send + Sync,
{
    async fn read_status(&self) -> Result<DeviceStatus, CloudError> {
        self.get_device_status().await
    }

    async fn set_switch(&self, on: bool) -> Result<bool, CloudError> {
        self.send_switch_command(on).await
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, CloudError> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|error| CloudError::MalformedResponse(format!("invalid JSON body: {error}")))
}
