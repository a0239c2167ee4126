use std::time::Duration;

use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::N8nConfig;

/// Failure to hand a payload to n8n
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("N8N_WEBHOOK_URL is not configured")]
    NotConfigured,

    /// n8n answered, but not with a 2xx
    #[error("n8n rejected the request with status {status}")]
    RemoteRejected { status: u16, body: String },

    /// The request went out but nothing usable came back
    #[error("No response from n8n: {message}")]
    NoResponse { message: String },

    /// The request could not be built or sent
    #[error("Could not prepare n8n request: {message}")]
    SetupFailure { message: String },
}

impl DispatchError {
    /// Upstream status code, present only for [`DispatchError::RemoteRejected`]
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A file plus its JSON sidecar, sent as one multipart request
#[derive(Debug, Clone)]
pub struct DispatchPayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub metadata: Value,
}

impl DispatchPayload {
    /// Small text file used to check the webhook end to end
    pub fn connectivity_test() -> Self {
        Self {
            file_name: "docflow-webhook-test.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: b"docflow webhook connectivity test".to_vec(),
            metadata: json!({
                "fileId": Uuid::new_v4().to_string(),
                "test": true,
                "sentAt": Utc::now().to_rfc3339(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: String,
}

/// Outbound multipart POSTs to the n8n webhook
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl WebhookDispatcher {
    pub fn new(config: &N8nConfig) -> Self {
        Self::with_endpoint(config.webhook_url.clone(), config.timeout())
    }

    pub fn with_endpoint(endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout,
        }
    }

    /// The configured endpoint, checked before any network activity
    pub fn endpoint(&self) -> Result<&str, DispatchError> {
        self.endpoint.as_deref().ok_or(DispatchError::NotConfigured)
    }

    /// Send the connectivity-test payload to the configured endpoint
    pub async fn send_test(&self, token: &str) -> Result<DispatchResponse, DispatchError> {
        let endpoint = self.endpoint()?;
        self.send(DispatchPayload::connectivity_test(), endpoint, token).await
    }

    /// Forward an uploaded file to the configured endpoint
    pub async fn send_file(&self, payload: DispatchPayload, token: &str) -> Result<DispatchResponse, DispatchError> {
        let endpoint = self.endpoint()?;
        self.send(payload, endpoint, token).await
    }

    pub async fn send(
        &self,
        payload: DispatchPayload,
        endpoint: &str,
        token: &str,
    ) -> Result<DispatchResponse, DispatchError> {
        let url = parse_endpoint(endpoint)?;
        let form = build_form(payload)?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(token)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response.text().await;

        if !status.is_success() {
            // A status line arrived, so this is a rejection even if the body was cut short
            let body = body.unwrap_or_else(|e| format!("failed to read response body: {}", e));
            warn!(status = status.as_u16(), host = url.host_str().unwrap_or_default(), "n8n rejected dispatch");
            return Err(DispatchError::RemoteRejected { status: status.as_u16(), body });
        }

        let body = body.map_err(|e| DispatchError::NoResponse {
            message: format!("failed to read response body: {}", e),
        })?;

        info!(status = status.as_u16(), host = url.host_str().unwrap_or_default(), "Dispatched payload to n8n");
        Ok(DispatchResponse { status: status.as_u16(), body })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<url::Url, DispatchError> {
    let url = url::Url::parse(endpoint).map_err(|e| DispatchError::SetupFailure {
        message: format!("invalid webhook URL: {}", e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DispatchError::SetupFailure {
            message: format!("unsupported webhook URL scheme '{}'", other),
        }),
    }
}

fn build_form(payload: DispatchPayload) -> Result<Form, DispatchError> {
    let file = Part::bytes(payload.bytes)
        .file_name(payload.file_name)
        .mime_str(&payload.content_type)
        .map_err(|e| DispatchError::SetupFailure {
            message: format!("invalid content type '{}': {}", payload.content_type, e),
        })?;

    let metadata = Part::text(payload.metadata.to_string())
        .mime_str("application/json")
        .map_err(|e| DispatchError::SetupFailure { message: e.to_string() })?;

    Ok(Form::new().part("file", file).part("metadata", metadata))
}

fn classify_send_error(err: reqwest::Error) -> DispatchError {
    if err.is_builder() {
        error!("Failed to build n8n request: {}", err);
        return DispatchError::SetupFailure { message: err.to_string() };
    }

    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    error!("n8n dispatch got no response: {}", message);
    DispatchError::NoResponse { message }
}
