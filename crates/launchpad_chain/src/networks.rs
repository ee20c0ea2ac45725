use std::fmt;

use serde::{Deserialize, Serialize};

/// Native gas token of a network. Determines the minimum balance an operator
/// wallet should hold before deploying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NativeToken {
    Eth,
    Ton,
}

impl NativeToken {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eth => "ETH",
            Self::Ton => "TON",
        }
    }

    pub fn decimals(self) -> u8 {
        18
    }

    /// Minimum recommended balance in the smallest unit.
    ///
    /// Below this a warning is shown; advancement is never blocked.
    pub fn min_recommended_balance(self) -> u128 {
        match self {
            Self::Eth => 50_000_000_000_000_000,     // 0.05 ETH
            Self::Ton => 10_000_000_000_000_000_000, // 10 TON
        }
    }
}

impl fmt::Display for NativeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A network the console already knows how to reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPreset {
    /// Stable identifier stored in wizard state.
    pub key: String,
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_token: NativeToken,
}

/// Returns the built-in deployed networks. The first entry is the default.
pub fn get_network_presets() -> Vec<NetworkPreset> {
    vec![
        NetworkPreset {
            key: "thanos-sepolia".into(),
            name: "Thanos Sepolia".into(),
            chain_id: 111_551_119_090,
            rpc_url: "https://rpc.thanos-sepolia.tokamak.network".into(),
            explorer_url: "https://explorer.thanos-sepolia.tokamak.network".into(),
            native_token: NativeToken::Ton,
        },
        NetworkPreset {
            key: "sepolia".into(),
            name: "Ethereum Sepolia".into(),
            chain_id: 11_155_111,
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".into(),
            explorer_url: "https://sepolia.etherscan.io".into(),
            native_token: NativeToken::Eth,
        },
        NetworkPreset {
            key: "mainnet".into(),
            name: "Ethereum Mainnet".into(),
            chain_id: 1,
            rpc_url: "https://eth.llamarpc.com".into(),
            explorer_url: "https://etherscan.io".into(),
            native_token: NativeToken::Eth,
        },
    ]
}

/// Look up a preset by key.
pub fn find_network(key: &str) -> Option<NetworkPreset> {
    get_network_presets().into_iter().find(|n| n.key == key)
}

/// Key of the network preselected in a fresh wizard.
pub fn default_network() -> &'static str {
    "thanos-sepolia"
}
