//! Chain error types.

/// Errors raised while deriving keys or talking to an RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The private key is not 32 bytes of hex or is not a valid secp256k1 scalar.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    /// Connect/send/receive failure, including timeouts.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}
