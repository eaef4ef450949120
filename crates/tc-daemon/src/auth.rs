//! Alert webhook authentication: first match of a shared token header, then
//! an HMAC-SHA256 body signature. Both are optional per-deployment — a
//! daemon with neither secret configured accepts any caller, matching the
//! webhook's original open-by-default posture.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_HEADER: &str = "x-alert-token";
pub const SIGNATURE_HEADER: &str = "x-alert-signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    TokenMismatch,
    SignatureMissing,
    SignatureMismatch,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::TokenMismatch => write!(f, "X-ALERT-TOKEN did not match"),
            AuthFailure::SignatureMissing => write!(f, "X-ALERT-SIGNATURE required but missing"),
            AuthFailure::SignatureMismatch => write!(f, "X-ALERT-SIGNATURE did not match"),
        }
    }
}

/// Verify inbound alert auth. Checks the shared token first (if configured),
/// then the HMAC signature (if configured); a deployment with neither set
/// always passes.
pub fn verify_alert_auth(
    shared_token: Option<&str>,
    hmac_secret: Option<&str>,
    token_header: Option<&str>,
    signature_header: Option<&str>,
    raw_body: &[u8],
) -> Result<(), AuthFailure> {
    if let Some(expected) = shared_token {
        match token_header {
            Some(got) if constant_time_eq(got.as_bytes(), expected.as_bytes()) => return Ok(()),
            _ => return Err(AuthFailure::TokenMismatch),
        }
    }

    if let Some(secret) = hmac_secret {
        let header = signature_header.ok_or(AuthFailure::SignatureMissing)?;
        let hex_sig = header.strip_prefix("sha256=").unwrap_or(header);
        let expected = hmac_sha256_hex(secret.as_bytes(), raw_body);
        if constant_time_eq(hex_sig.as_bytes(), expected.as_bytes()) {
            return Ok(());
        }
        return Err(AuthFailure::SignatureMismatch);
    }

    Ok(())
}

pub fn hmac_sha256_hex(key: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_secrets_configured_always_passes() {
        assert!(verify_alert_auth(None, None, None, None, b"{}").is_ok());
    }

    #[test]
    fn matching_shared_token_passes() {
        assert!(verify_alert_auth(Some("s3cr3t"), None, Some("s3cr3t"), None, b"{}").is_ok());
    }

    #[test]
    fn mismatched_shared_token_fails() {
        assert_eq!(
            verify_alert_auth(Some("s3cr3t"), None, Some("wrong"), None, b"{}"),
            Err(AuthFailure::TokenMismatch)
        );
    }

    #[test]
    fn valid_hmac_signature_passes() {
        let body = b"{\"symbol\":\"EURUSD\"}";
        let sig = hmac_sha256_hex(b"hmac-key", body);
        let header = format!("sha256={sig}");
        assert!(verify_alert_auth(None, Some("hmac-key"), None, Some(&header), body).is_ok());
    }

    #[test]
    fn missing_signature_header_fails_when_hmac_is_required() {
        assert_eq!(
            verify_alert_auth(None, Some("hmac-key"), None, None, b"{}"),
            Err(AuthFailure::SignatureMissing)
        );
    }

    #[test]
    fn token_check_is_tried_before_signature_check() {
        // Both configured, token matches -> never looks at the (absent) signature.
        assert!(verify_alert_auth(Some("s3cr3t"), Some("hmac-key"), Some("s3cr3t"), None, b"{}").is_ok());
    }
}
