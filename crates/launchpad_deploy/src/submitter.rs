use std::sync::Arc;

use launchpad_core::ConsoleError;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{
    BackendError, DeploymentBackend, LeaderDeploymentRequest, RegularDeploymentRequest, SubmitAck,
};
use crate::cache::QueryCache;
use crate::fields::{Variant, WizardFields};
use crate::step_graph::Step;
use crate::validation::{self, FieldError, validate_port};

/// Shown when the backend rejects a request without saying why.
pub const FALLBACK_MESSAGE: &str = "Failed to deploy DRB node";
pub const REMOVAL_FALLBACK_MESSAGE: &str = "Failed to remove DRB node";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// A reachable step failed validation; nothing was sent.
    #[error("{}: {}", .step.title(), .errors.first().map(|e| e.message.as_str()).unwrap_or("invalid input"))]
    Validation { step: Step, errors: Vec<FieldError> },

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    BackendRejected(String),
}

impl SubmissionError {
    /// Text for the wizard's error step.
    pub fn user_message(&self) -> String {
        ConsoleError::from(self.clone()).user_message()
    }

    fn from_backend(err: BackendError, fallback: &str) -> Self {
        match err {
            BackendError::Transport(message) => Self::Network(message),
            BackendError::Rejected { message, .. } => {
                Self::BackendRejected(rejection_message(message, fallback))
            }
            BackendError::Decode(message) | BackendError::NotFound(message) => {
                warn!(%message, "unusable backend response");
                Self::BackendRejected(fallback.into())
            }
        }
    }
}

impl From<SubmissionError> for ConsoleError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation { .. } => ConsoleError::Validation(err.to_string()),
            SubmissionError::Network(message) => ConsoleError::Network(message),
            SubmissionError::BackendRejected(message) => ConsoleError::Backend(message),
        }
    }
}

fn rejection_message(message: Option<String>, fallback: &str) -> String {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// An accepted deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub resource_id: String,
    /// Absent when the backend completed the request synchronously.
    pub job_id: Option<String>,
    pub variant: Variant,
}

/// Packages wizard fields into a deployment request and sends it.
pub struct DeploymentSubmitter {
    backend: Arc<dyn DeploymentBackend>,
    cache: Arc<QueryCache>,
}

impl DeploymentSubmitter {
    pub fn new(backend: Arc<dyn DeploymentBackend>, cache: Arc<QueryCache>) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Check every data-entry step reachable under `variant`.
    pub fn validate(variant: Variant, fields: &WizardFields) -> Result<(), SubmissionError> {
        match validation::first_invalid_step(variant, fields) {
            Some((step, errors)) => Err(SubmissionError::Validation { step, errors }),
            None => Ok(()),
        }
    }

    /// Build the leader payload. Reads no regular-only fields.
    pub fn build_leader_request(fields: &WizardFields) -> Result<LeaderDeploymentRequest, SubmissionError> {
        Self::validate(Variant::Leader, fields)?;
        let (rpc_url, chain_id) = resolve_network(fields)?;
        Ok(LeaderDeploymentRequest {
            rpc_url,
            chain_id,
            private_key: normalize_key(&fields.config.private_key),
            node_port: port(&fields.config.node_port, Step::Config, "nodePort")?,
            aws_credential_id: fields.aws.credential_id.trim().to_string(),
            aws_region: fields.aws.region.trim().to_string(),
            database_username: fields.database.username.trim().to_string(),
            database_password: fields.database.password.clone(),
        })
    }

    pub fn build_regular_request(
        fields: &WizardFields,
    ) -> Result<RegularDeploymentRequest, SubmissionError> {
        Self::validate(Variant::Regular, fields)?;
        let (rpc_url, chain_id) = resolve_network(fields)?;
        let conn = &fields.leader_connection;
        Ok(RegularDeploymentRequest {
            rpc_url,
            chain_id,
            private_key: normalize_key(&fields.config.private_key),
            node_port: port(&fields.config.node_port, Step::Config, "nodePort")?,
            leader_ip: conn.leader_ip.trim().to_string(),
            leader_port: port(&conn.leader_port, Step::LeaderConnection, "leaderPort")?,
            leader_address: conn.leader_address.trim().to_string(),
            key_pair_name: fields.ec2.key_pair_name.trim().to_string(),
            instance_type: fields.ec2.instance_type.trim().to_string(),
            aws_credential_id: fields.aws.credential_id.trim().to_string(),
            aws_region: fields.aws.region.trim().to_string(),
            database_username: fields.database.username.trim().to_string(),
            database_password: fields.database.password.clone(),
        })
    }

    /// Validate, resolve the target resource, and submit.
    pub async fn submit(
        &self,
        fields: &WizardFields,
        variant: Variant,
        resource_id: Option<&str>,
    ) -> Result<JobHandle, SubmissionError> {
        // Build first so invalid input never triggers a network call.
        enum Payload {
            Leader(LeaderDeploymentRequest),
            Regular(RegularDeploymentRequest),
        }
        let payload = match variant {
            Variant::Leader => Payload::Leader(Self::build_leader_request(fields)?),
            Variant::Regular => Payload::Regular(Self::build_regular_request(fields)?),
        };

        let resource_id = self.resolve_resource(resource_id).await?;
        info!(%variant, resource_id = %resource_id, "submitting DRB deployment");

        let result = match &payload {
            Payload::Leader(request) => self.backend.submit_leader_deployment(&resource_id, request).await,
            Payload::Regular(request) => self.backend.submit_regular_deployment(&resource_id, request).await,
        };
        let ack = accept(result, FALLBACK_MESSAGE)?;

        self.cache.invalidate(&resource_id);
        info!(resource_id = %resource_id, job_id = ?ack.job_id, "DRB deployment accepted");
        Ok(JobHandle {
            resource_id,
            job_id: ack.job_id,
            variant,
        })
    }

    /// Tear down the DRB integration of `resource_id`.
    pub async fn remove(&self, resource_id: &str) -> Result<SubmitAck, SubmissionError> {
        info!(resource_id, "removing DRB deployment");
        let result = self.backend.remove_deployment(resource_id).await;
        let ack = accept(result, REMOVAL_FALLBACK_MESSAGE)?;
        self.cache.invalidate(resource_id);
        Ok(ack)
    }

    async fn resolve_resource(&self, resource_id: Option<&str>) -> Result<String, SubmissionError> {
        if let Some(id) = resource_id.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        let resource = self
            .backend
            .resolve_default_resource()
            .await
            .map_err(|e| SubmissionError::from_backend(e, FALLBACK_MESSAGE))?;
        if resource.id.trim().is_empty() {
            return Err(SubmissionError::BackendRejected(
                "No default resource is available".into(),
            ));
        }
        Ok(resource.id)
    }
}

fn accept(result: Result<SubmitAck, BackendError>, fallback: &str) -> Result<SubmitAck, SubmissionError> {
    let ack = result.map_err(|e| SubmissionError::from_backend(e, fallback))?;
    if !ack.accepted {
        return Err(SubmissionError::BackendRejected(rejection_message(ack.message, fallback)));
    }
    Ok(ack)
}

fn resolve_network(fields: &WizardFields) -> Result<(String, u64), SubmissionError> {
    let network = &fields.network;
    match (network.resolved_rpc_url(), network.resolved_chain_id()) {
        (Some(url), Some(chain_id)) => Ok((url, chain_id)),
        _ => Err(SubmissionError::Validation {
            step: Step::Network,
            errors: vec![FieldError {
                field: "rpcUrl",
                message: "Network could not be resolved".into(),
            }],
        }),
    }
}

fn port(raw: &str, step: Step, field: &'static str) -> Result<u16, SubmissionError> {
    validate_port(raw).map_err(|message| SubmissionError::Validation {
        step,
        errors: vec![FieldError { field, message }],
    })
}

/// Keys are sent with a `0x` prefix.
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let hex = key
        .strip_prefix("0x")
        .or_else(|| key.strip_prefix("0X"))
        .unwrap_or(key);
    format!("0x{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_falls_back_when_blank() {
        assert_eq!(rejection_message(None, FALLBACK_MESSAGE), FALLBACK_MESSAGE);
        assert_eq!(rejection_message(Some("   ".into()), FALLBACK_MESSAGE), FALLBACK_MESSAGE);
        assert_eq!(
            rejection_message(Some("Quota exceeded".into()), FALLBACK_MESSAGE),
            "Quota exceeded"
        );
    }

    #[test]
    fn backend_errors_map_to_channels() {
        assert_eq!(
            SubmissionError::from_backend(BackendError::Transport("reset".into()), FALLBACK_MESSAGE),
            SubmissionError::Network("reset".into())
        );
        assert_eq!(
            SubmissionError::from_backend(
                BackendError::Rejected {
                    status: 400,
                    message: Some("bad region".into()),
                },
                FALLBACK_MESSAGE,
            ),
            SubmissionError::BackendRejected("bad region".into())
        );
        assert_eq!(
            SubmissionError::from_backend(BackendError::Decode("eof".into()), REMOVAL_FALLBACK_MESSAGE),
            SubmissionError::BackendRejected(REMOVAL_FALLBACK_MESSAGE.into())
        );
    }

    #[test]
    fn normalize_key_adds_prefix_once() {
        let hex = "ab".repeat(32);
        assert_eq!(normalize_key(&hex), format!("0x{hex}"));
        assert_eq!(normalize_key(&format!("0x{hex}")), format!("0x{hex}"));
        assert_eq!(normalize_key(&format!(" 0X{hex} ")), format!("0x{hex}"));
    }

    #[test]
    fn validation_message_names_the_step() {
        let err = SubmissionError::Validation {
            step: Step::LeaderConnection,
            errors: vec![FieldError {
                field: "leaderPort",
                message: "Port is required".into(),
            }],
        };
        assert_eq!(err.to_string(), "Leader Connection: Port is required");
    }

    #[test]
    fn user_message_is_verbatim_for_rejections() {
        let err = SubmissionError::BackendRejected("Stack is not running".into());
        assert_eq!(err.user_message(), "Stack is not running");
        let net = SubmissionError::Network("dns".into());
        assert!(net.user_message().contains("Network error"));
    }
}
