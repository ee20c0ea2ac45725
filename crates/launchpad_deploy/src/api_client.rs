use std::time::Duration;

use async_trait::async_trait;
use launchpad_core::ConsoleConfig;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::backend::{
    BackendError, DeploymentBackend, JobStatusSource, LeaderDeploymentRequest,
    RegularDeploymentRequest, ResourceRef, SubmitAck,
};
use crate::credentials::{AwsCredential, CredentialKind, CredentialStore, RegionLister};
use crate::job::DeploymentJob;

const API_PREFIX: &str = "/api/v1";

/// Client for the console's REST API.
///
/// Implements every backend seam the wizard and the poller depend on.
pub struct ConsoleApiClient {
    base_url: String,
    client: Client,
}

impl ConsoleApiClient {
    /// Create a client against `base_url`. A token, when given, is sent as a
    /// bearer header on every request.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let auth = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| BackendError::Transport("invalid characters in API token".into()))?;
            headers.insert(AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, BackendError> {
        Self::new(
            config.api_base_url.as_str(),
            config.api_token.as_deref(),
            config.request_timeout(),
        )
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    fn drb_url(&self, resource_id: &str, suffix: &str) -> String {
        self.url(&format!("/resources/{resource_id}/integrations/drb{suffix}"))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let value = self.send_raw(request).await?;
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Like `send`, but a 2xx with no body (204 No Content) is an accepted ack.
    async fn send_ack(&self, request: RequestBuilder) -> Result<SubmitAck, BackendError> {
        decode_ack(self.send_raw(request).await?)
    }

    /// Map non-2xx to `Rejected` and return the body with any `data`
    /// envelope removed. An empty body is `Null`.
    async fn send_raw(&self, request: RequestBuilder) -> Result<Value, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let value: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?
        };
        Ok(unwrap_data(value))
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        self.send(self.client.post(url).json(body)).await
    }
}

fn decode_ack(value: Value) -> Result<SubmitAck, BackendError> {
    if value.is_null() {
        return Ok(SubmitAck::default());
    }
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body. Accepts
/// `{"message": ...}` and `{"error": ...}`, else the raw text if short.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return ["message", "error"]
            .iter()
            .filter_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(str::to_string);
    }
    (trimmed.len() <= 200).then(|| trimmed.to_string())
}

/// Some endpoints wrap their payload as `{"data": ...}`.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl DeploymentBackend for ConsoleApiClient {
    async fn resolve_default_resource(&self) -> Result<ResourceRef, BackendError> {
        let url = self.url("/resources/default");
        debug!(url = %url, "resolving default resource");
        self.post(&url, &json!({})).await
    }

    async fn submit_leader_deployment(
        &self,
        resource_id: &str,
        request: &LeaderDeploymentRequest,
    ) -> Result<SubmitAck, BackendError> {
        let url = self.drb_url(resource_id, "/leader");
        debug!(url = %url, "submitting DRB leader deployment");
        self.send_ack(self.client.post(&url).json(request)).await
    }

    async fn submit_regular_deployment(
        &self,
        resource_id: &str,
        request: &RegularDeploymentRequest,
    ) -> Result<SubmitAck, BackendError> {
        let url = self.drb_url(resource_id, "/regular");
        debug!(url = %url, "submitting DRB regular deployment");
        self.send_ack(self.client.post(&url).json(request)).await
    }

    async fn remove_deployment(&self, resource_id: &str) -> Result<SubmitAck, BackendError> {
        let url = self.drb_url(resource_id, "");
        debug!(url = %url, "removing DRB deployment");
        self.send_ack(self.client.delete(&url)).await
    }
}

#[async_trait]
impl JobStatusSource for ConsoleApiClient {
    async fn job_status(&self, job_id: &str) -> Result<DeploymentJob, BackendError> {
        let url = self.url(&format!("/tasks/{job_id}"));
        debug!(url = %url, "fetching job status");
        self.send(self.client.get(&url)).await
    }
}

#[async_trait]
impl CredentialStore for ConsoleApiClient {
    async fn list_credentials(&self, kind: CredentialKind) -> Result<Vec<AwsCredential>, BackendError> {
        let url = self.url("/credentials");
        debug!(url = %url, kind = kind.as_str(), "listing credentials");
        self.send(self.client.get(&url).query(&[("type", kind.as_str())]))
            .await
    }
}

#[async_trait]
impl RegionLister for ConsoleApiClient {
    async fn list_regions(
        &self,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Vec<String>, BackendError> {
        let url = self.url("/aws/regions");
        debug!(url = %url, "listing AWS regions");
        let body = json!({
            "accessKeyId": access_key_id,
            "secretAccessKey": secret_access_key,
        });
        self.post(&url, &body).await
    }
}
