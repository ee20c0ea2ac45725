//! Field-level checks that gate forward navigation. Pure, no I/O.

use launchpad_chain::{find_network, is_evm_address, is_private_key, validate_url};

use crate::fields::{NetworkMode, Variant, WizardFields};
use crate::step_graph::{self, Step};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
/// Rejected by the managed database provisioning call.
pub const PASSWORD_RESERVED_CHARS: [char; 5] = ['/', '\'', '"', '@', ' '];

/// An inline error to render next to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Whether the operator may leave `step` going forward.
pub fn can_advance(step: Step, fields: &WizardFields) -> bool {
    step.is_data_entry() && field_errors(step, fields).is_empty()
}

/// All problems with the fields owned by `step`. Empty for steps without
/// required input.
pub fn field_errors(step: Step, fields: &WizardFields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match step {
        Step::Mode | Step::Info | Step::Deploying | Step::Success | Step::Error => {}
        Step::Network => {
            let network = &fields.network;
            if network.mode == NetworkMode::Deployed && find_network(&network.deployed_network).is_none() {
                errors.push(FieldError::new("deployedNetwork", "Select a known network"));
            }
            if network.mode == NetworkMode::Custom {
                let rpc_url = network.rpc_url.trim();
                if rpc_url.is_empty() {
                    errors.push(FieldError::new("rpcUrl", "RPC URL is required"));
                } else if !validate_url(rpc_url) {
                    errors.push(FieldError::new("rpcUrl", "RPC URL must be an http(s) URL"));
                }
                if network.chain_id.trim().is_empty() {
                    errors.push(FieldError::new("chainId", "Chain ID is required"));
                } else if network.chain_id.trim().parse::<u64>().is_err() {
                    errors.push(FieldError::new("chainId", "Chain ID must be a number"));
                }
            }
        }
        Step::LeaderConnection => {
            let conn = &fields.leader_connection;
            if conn.leader_ip.trim().is_empty() {
                errors.push(FieldError::new("leaderIp", "Leader IP is required"));
            }
            if let Err(message) = validate_port(&conn.leader_port) {
                errors.push(FieldError::new("leaderPort", message));
            }
            if !is_evm_address(&conn.leader_address) {
                errors.push(FieldError::new(
                    "leaderAddress",
                    "Leader EOA must be 0x followed by 40 hex characters",
                ));
            }
        }
        Step::Config => {
            if !is_private_key(&fields.config.private_key) {
                errors.push(FieldError::new(
                    "privateKey",
                    "Private key must be 64 hex characters (0x prefix optional)",
                ));
            }
            if let Err(message) = validate_port(&fields.config.node_port) {
                errors.push(FieldError::new("nodePort", message));
            }
        }
        Step::Ec2 => {
            if fields.ec2.key_pair_name.trim().is_empty() {
                errors.push(FieldError::new("keyPairName", "EC2 key pair name is required"));
            }
            if fields.ec2.instance_type.trim().is_empty() {
                errors.push(FieldError::new("instanceType", "Instance type is required"));
            }
        }
        Step::Aws => {
            if fields.aws.credential_id.trim().is_empty() {
                errors.push(FieldError::new("awsCredential", "Select an AWS credential"));
            }
            if fields.aws.region.trim().is_empty() {
                errors.push(FieldError::new("awsRegion", "Select a region"));
            }
        }
        Step::Database => {
            if fields.database.username.trim().is_empty() {
                errors.push(FieldError::new("databaseUsername", "Username is required"));
            }
            if let Err(message) = validate_password(&fields.database.password) {
                errors.push(FieldError::new("databasePassword", message));
            }
        }
    }
    errors
}

/// The first step on `variant`'s path whose fields fail validation.
pub fn first_invalid_step(variant: Variant, fields: &WizardFields) -> Option<(Step, Vec<FieldError>)> {
    step_graph::steps(variant).into_iter().find_map(|step| {
        let errors = field_errors(step, fields);
        (!errors.is_empty()).then_some((step, errors))
    })
}

/// Password policy for the managed database.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(format!("Password must be at least {PASSWORD_MIN_LEN} characters"));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(format!("Password must be at most {PASSWORD_MAX_LEN} characters"));
    }
    if let Some(c) = password.chars().find(|c| PASSWORD_RESERVED_CHARS.contains(c)) {
        let shown = if c == ' ' { "space".to_string() } else { format!("'{c}'") };
        return Err(format!("Password must not contain {shown}"));
    }
    Ok(())
}

/// A present, numeric, non-zero TCP port.
pub fn validate_port(port: &str) -> Result<u16, String> {
    let trimmed = port.trim();
    if trimmed.is_empty() {
        return Err("Port is required".into());
    }
    match trimmed.parse::<u16>() {
        Ok(0) | Err(_) => Err("Port must be between 1 and 65535".into()),
        Ok(p) => Ok(p),
    }
}
