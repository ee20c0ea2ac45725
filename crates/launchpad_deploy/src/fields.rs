use std::fmt;

use launchpad_chain::{NativeToken, default_network, find_network, validate_url};
use serde::{Deserialize, Serialize};

use crate::step_graph::Step;

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Which DRB node is being provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Coordinates the beacon round; deploys the on-chain contracts.
    #[default]
    Leader,
    /// Joins an existing leader.
    Regular,
}

impl Variant {
    pub fn label(self) -> &'static str {
        match self {
            Self::Leader => "Leader Node",
            Self::Regular => "Regular Node",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Per-step field groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// One of the console's known networks.
    #[default]
    Deployed,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkFields {
    pub mode: NetworkMode,
    /// Preset key, used when `mode` is `Deployed`.
    pub deployed_network: String,
    pub rpc_url: String,
    pub chain_id: String,
}

impl Default for NetworkFields {
    fn default() -> Self {
        Self {
            mode: NetworkMode::Deployed,
            deployed_network: default_network().to_string(),
            rpc_url: String::new(),
            chain_id: String::new(),
        }
    }
}

impl NetworkFields {
    /// RPC URL the node and wallet probes should use, if one can be resolved.
    pub fn resolved_rpc_url(&self) -> Option<String> {
        match self.mode {
            NetworkMode::Deployed => find_network(&self.deployed_network).map(|n| n.rpc_url),
            NetworkMode::Custom => {
                let url = self.rpc_url.trim();
                validate_url(url).then(|| url.to_string())
            }
        }
    }

    pub fn resolved_chain_id(&self) -> Option<u64> {
        match self.mode {
            NetworkMode::Deployed => find_network(&self.deployed_network).map(|n| n.chain_id),
            NetworkMode::Custom => self.chain_id.trim().parse().ok(),
        }
    }

    /// Custom networks are assumed to use ETH as gas token.
    pub fn native_token(&self) -> NativeToken {
        match self.mode {
            NetworkMode::Deployed => find_network(&self.deployed_network)
                .map(|n| n.native_token)
                .unwrap_or(NativeToken::Eth),
            NetworkMode::Custom => NativeToken::Eth,
        }
    }
}

/// Where a regular node finds its leader. Regular variant only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderConnectionFields {
    pub leader_ip: String,
    pub leader_port: String,
    /// Leader node EOA.
    pub leader_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFields {
    /// Deployer key (leader) or node EOA key (regular). Never serialized.
    #[serde(skip)]
    pub private_key: String,
    pub node_port: String,
}

impl Default for ConfigFields {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            node_port: "61280".into(),
        }
    }
}

/// Compute sizing for a regular node. Regular variant only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ec2Fields {
    pub key_pair_name: String,
    pub instance_type: String,
}

impl Default for Ec2Fields {
    fn default() -> Self {
        Self {
            key_pair_name: String::new(),
            instance_type: "t3.medium".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsFields {
    /// Id of a stored AWS credential, not the key itself.
    pub credential_id: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseFields {
    pub username: String,
    #[serde(skip)]
    pub password: String,
}

/// Everything the operator has entered so far, grouped by step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardFields {
    pub network: NetworkFields,
    pub leader_connection: LeaderConnectionFields,
    pub config: ConfigFields,
    pub ec2: Ec2Fields,
    pub aws: AwsFields,
    pub database: DatabaseFields,
}

impl WizardFields {
    /// Restore fields that exist only on one variant's path.
    pub fn reset_variant_exclusive(&mut self) {
        self.leader_connection = LeaderConnectionFields::default();
        self.ec2 = Ec2Fields::default();
    }

    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::NetworkMode(mode) => self.network.mode = mode,
            FieldUpdate::DeployedNetwork(key) => self.network.deployed_network = key,
            FieldUpdate::RpcUrl(url) => self.network.rpc_url = url,
            FieldUpdate::ChainId(id) => self.network.chain_id = id,
            FieldUpdate::LeaderIp(ip) => self.leader_connection.leader_ip = ip,
            FieldUpdate::LeaderPort(port) => self.leader_connection.leader_port = port,
            FieldUpdate::LeaderAddress(addr) => self.leader_connection.leader_address = addr,
            FieldUpdate::PrivateKey(key) => self.config.private_key = key,
            FieldUpdate::NodePort(port) => self.config.node_port = port,
            FieldUpdate::KeyPairName(name) => self.ec2.key_pair_name = name,
            FieldUpdate::InstanceType(kind) => self.ec2.instance_type = kind,
            FieldUpdate::AwsCredential(id) => {
                // Regions are listed per credential.
                if self.aws.credential_id != id {
                    self.aws.region.clear();
                }
                self.aws.credential_id = id;
            }
            FieldUpdate::AwsRegion(region) => self.aws.region = region,
            FieldUpdate::DatabaseUsername(name) => self.database.username = name,
            FieldUpdate::DatabasePassword(password) => self.database.password = password,
        }
    }
}

/// A single form edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    NetworkMode(NetworkMode),
    DeployedNetwork(String),
    RpcUrl(String),
    ChainId(String),
    LeaderIp(String),
    LeaderPort(String),
    LeaderAddress(String),
    PrivateKey(String),
    NodePort(String),
    KeyPairName(String),
    InstanceType(String),
    AwsCredential(String),
    AwsRegion(String),
    DatabaseUsername(String),
    DatabasePassword(String),
}

impl FieldUpdate {
    /// The step that owns the edited field.
    pub fn step(&self) -> Step {
        match self {
            Self::NetworkMode(_) | Self::DeployedNetwork(_) | Self::RpcUrl(_) | Self::ChainId(_) => {
                Step::Network
            }
            Self::LeaderIp(_) | Self::LeaderPort(_) | Self::LeaderAddress(_) => {
                Step::LeaderConnection
            }
            Self::PrivateKey(_) | Self::NodePort(_) => Step::Config,
            Self::KeyPairName(_) | Self::InstanceType(_) => Step::Ec2,
            Self::AwsCredential(_) | Self::AwsRegion(_) => Step::Aws,
            Self::DatabaseUsername(_) | Self::DatabasePassword(_) => Step::Database,
        }
    }

    /// Whether the edit can change the `(private key, RPC URL)` pair a wallet
    /// probe is keyed on.
    pub fn affects_probe(&self) -> bool {
        matches!(
            self,
            Self::PrivateKey(_)
                | Self::NetworkMode(_)
                | Self::DeployedNetwork(_)
                | Self::RpcUrl(_)
        )
    }
}
