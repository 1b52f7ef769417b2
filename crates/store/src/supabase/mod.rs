//! Supabase project client
//!
//! Records go through PostgREST (`/rest/v1`), blobs through Storage
//! (`/storage/v1`) and change events through the Realtime websocket
//! (`/realtime/v1/websocket`).

mod realtime;
mod rest;

use std::time::Duration;

use hadir_config::BackendConfig;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::error::StoreError;

#[derive(Clone)]
pub struct SupabaseBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    heartbeat: Duration,
}

impl std::fmt::Debug for SupabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseBackend")
            .field("base_url", &self.base_url)
            .field("heartbeat", &self.heartbeat)
            .finish_non_exhaustive()
    }
}

impl SupabaseBackend {
    pub fn new(base_url: &str, anon_key: &str, heartbeat: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            heartbeat,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StoreError::Config("Supabase URL is not set".into()))?;
        let key = config
            .anon_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StoreError::Config("Supabase anon key is not set".into()))?;
        debug!("Supabase backend at {}", url);
        Ok(Self::new(
            url,
            key,
            Duration::from_secs(config.heartbeat_secs.max(1)),
        ))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

/// Error body shared by PostgREST and Storage
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    /// String in current Storage releases, number in older ones
    #[serde(default, rename = "statusCode")]
    status_code: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Pass successful responses through; turn failures into classified errors
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

fn error_from_body(status: u16, body: &str) -> StoreError {
    let parsed: ApiError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .or_else(|| parsed.error.clone())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));

    let status_code = parsed.status_code.as_ref().map(|v| match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    let conflict = status == 409
        || status_code.as_deref() == Some("409")
        || parsed.error.as_deref() == Some("Duplicate");
    if conflict && parsed.code.is_none() {
        return StoreError::Duplicate(message);
    }
    let code = parsed.code.or(status_code);
    StoreError::from_backend(code.as_deref(), &message)
}
