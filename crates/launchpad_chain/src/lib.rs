// EVM helpers for deployment wizards: network presets, key/address handling,
// and native balance lookups over JSON-RPC.

pub mod client;
pub mod error;
pub mod evm;
pub mod networks;
pub mod rpc_config;

// Re-export primary types for convenient access.
pub use client::{BalanceSource, JsonRpcClient};
pub use error::ChainError;
pub use evm::{derive_address, format_units, is_evm_address, is_private_key, to_checksum_address};
pub use networks::{NativeToken, NetworkPreset, default_network, find_network, get_network_presets};
pub use rpc_config::{normalize_rpc_url, validate_url};
