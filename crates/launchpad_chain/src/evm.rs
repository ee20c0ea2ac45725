use std::sync::LazyLock;

use k256::SecretKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use regex::Regex;
use sha3::{Digest, Keccak256};

use crate::error::ChainError;

static PRIVATE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0x)?[0-9a-fA-F]{64}$").expect("valid private key regex"));

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex"));

/// 64 hex characters with an optional `0x` prefix.
pub fn is_private_key(value: &str) -> bool {
    PRIVATE_KEY_RE.is_match(value.trim())
}

/// `0x` followed by 40 hex characters. Checksum casing is not enforced.
pub fn is_evm_address(value: &str) -> bool {
    ADDRESS_RE.is_match(value.trim())
}

/// Derive the EIP-55 checksummed address controlled by `private_key`.
///
/// Fails when the key does not match the hex pattern or is not a valid
/// secp256k1 scalar (zero, or not below the curve order).
pub fn derive_address(private_key: &str) -> Result<String, ChainError> {
    let trimmed = private_key.trim();
    if !is_private_key(trimmed) {
        return Err(ChainError::InvalidPrivateKey(
            "expected 64 hex characters".into(),
        ));
    }
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_part).map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;
    let secret = SecretKey::from_slice(&bytes)
        .map_err(|_| ChainError::InvalidPrivateKey("not a valid secp256k1 key".into()))?;

    let point = secret.public_key().to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag.
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    to_checksum_address(&format!("0x{}", hex::encode(&hash[12..])))
}

/// Apply EIP-55 mixed-case checksum encoding to an address.
pub fn to_checksum_address(address: &str) -> Result<String, ChainError> {
    if !is_evm_address(address) {
        return Err(ChainError::InvalidAddress(address.to_string()));
    }
    let lower = address.trim()[2..].to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Render an integer amount in the smallest unit as a decimal string.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit is
/// kept, so `10^18` with 18 decimals renders as `"1.0"`.
pub fn format_units(raw: u128, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(u32::from(decimals)) else {
        return raw.to_string();
    };
    if decimals == 0 {
        return format!("{raw}.0");
    }
    let whole = raw / scale;
    let frac = raw % scale;
    let frac = format!("{frac:0width$}", width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{frac}")
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1bc16d674ec80000"`.
pub fn parse_hex_quantity(value: &str) -> Result<u128, ChainError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::Decode(format!("quantity without 0x prefix: {value}")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ChainError::Decode(format!("bad quantity {value}: {e}")))
}
