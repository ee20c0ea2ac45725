use crate::error::ChainError;

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

/// Trim and validate an operator-supplied RPC URL.
pub fn normalize_rpc_url(url: &str) -> Result<String, ChainError> {
    let trimmed = url.trim();
    if !validate_url(trimmed) {
        return Err(ChainError::InvalidRpcUrl(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://rpc.example.com"));
        assert!(validate_url("http://localhost:8545"));
    }

    #[test]
    fn validate_url_rejects_garbage() {
        assert!(!validate_url(""));
        assert!(!validate_url("not a url"));
        assert!(!validate_url("ftp://server.com"));
        assert!(!validate_url("file:///etc/passwd"));
        assert!(!validate_url("ws://node.example.com"));
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(
            normalize_rpc_url("  https://rpc.example.com/ ").unwrap(),
            "https://rpc.example.com/"
        );
        assert!(matches!(
            normalize_rpc_url("localhost"),
            Err(ChainError::InvalidRpcUrl(_))
        ));
    }
}
