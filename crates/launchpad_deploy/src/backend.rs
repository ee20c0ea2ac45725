//! Backend seams for deployment submission and job status.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::DeploymentJob;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}{}", message_suffix(.message))]
    Rejected { status: u16, message: Option<String> },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// A stack or project a DRB integration is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

/// Backend acknowledgement of a deployment or removal request.
///
/// Only ever built from a 2xx response, so `accepted` is true unless the body
/// says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitAck {
    pub accepted: bool,
    pub job_id: Option<String>,
    pub message: Option<String>,
}

impl Default for SubmitAck {
    fn default() -> Self {
        Self {
            accepted: true,
            job_id: None,
            message: None,
        }
    }
}

/// Leader node payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderDeploymentRequest {
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: String,
    pub node_port: u16,
    pub aws_credential_id: String,
    pub aws_region: String,
    pub database_username: String,
    pub database_password: String,
}

impl fmt::Debug for LeaderDeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaderDeploymentRequest")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .field("node_port", &self.node_port)
            .field("aws_credential_id", &self.aws_credential_id)
            .field("aws_region", &self.aws_region)
            .field("database_username", &self.database_username)
            .field("database_password", &"<redacted>")
            .finish()
    }
}

/// Regular node payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularDeploymentRequest {
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: String,
    pub node_port: u16,
    pub leader_ip: String,
    pub leader_port: u16,
    pub leader_address: String,
    pub key_pair_name: String,
    pub instance_type: String,
    pub aws_credential_id: String,
    pub aws_region: String,
    pub database_username: String,
    pub database_password: String,
}

impl fmt::Debug for RegularDeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegularDeploymentRequest")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .field("node_port", &self.node_port)
            .field("leader_ip", &self.leader_ip)
            .field("leader_port", &self.leader_port)
            .field("leader_address", &self.leader_address)
            .field("key_pair_name", &self.key_pair_name)
            .field("instance_type", &self.instance_type)
            .field("aws_credential_id", &self.aws_credential_id)
            .field("aws_region", &self.aws_region)
            .field("database_username", &self.database_username)
            .field("database_password", &"<redacted>")
            .finish()
    }
}

/// Deployment endpoints of the console backend.
#[async_trait]
pub trait DeploymentBackend: Send + Sync {
    /// The resource deployments go to when the operator has not picked one.
    async fn resolve_default_resource(&self) -> Result<ResourceRef, BackendError>;

    async fn submit_leader_deployment(
        &self,
        resource_id: &str,
        request: &LeaderDeploymentRequest,
    ) -> Result<SubmitAck, BackendError>;

    async fn submit_regular_deployment(
        &self,
        resource_id: &str,
        request: &RegularDeploymentRequest,
    ) -> Result<SubmitAck, BackendError>;

    async fn remove_deployment(&self, resource_id: &str) -> Result<SubmitAck, BackendError>;
}

/// Read side of the job endpoint, polled by `TaskPoller`.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<DeploymentJob, BackendError>;
}
