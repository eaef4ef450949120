//! Runtime secret resolution.
//!
//! Config YAML stores only **env var NAMES**; this module is the single
//! place that turns a name into a value. Callers resolve once at startup
//! and pass `ResolvedSecrets` down — no `std::env::var` elsewhere. `Debug`
//! redacts every value; error messages name the env var, never its
//! content.
//!
//! Mode-aware enforcement:
//! - `Live`: the broker-credential encryption key is required.
//! - `Paper`: nothing is required — paper fills need no encrypted creds.
//! - `Backtest`: nothing is required.
//!
//! Alert webhook auth (shared token, HMAC secret) is always optional in
//! every mode.

use anyhow::{bail, Result};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Backtest,
    Paper,
    Live,
}

impl RunMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Ok(RunMode::Live),
            "PAPER" => Ok(RunMode::Paper),
            "BACKTEST" => Ok(RunMode::Backtest),
            other => bail!("SECRETS_UNKNOWN_MODE: unrecognised mode '{other}'; expected one of LIVE | PAPER | BACKTEST"),
        }
    }
}

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Decrypts `BrokerAccount.credentials`. Required in `Live`.
    pub broker_credentials_key: Option<String>,
    /// Shared-secret value for the `X-ALERT-TOKEN` header. Always optional.
    pub alert_shared_token: Option<String>,
    /// HMAC-SHA256 key for the `X-ALERT-SIGNATURE` header and dedupe-key
    /// derivation. Always optional.
    pub alert_hmac_secret: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("broker_credentials_key", &self.broker_credentials_key.as_ref().map(|_| "<REDACTED>"))
            .field("alert_shared_token", &self.alert_shared_token.as_ref().map(|_| "<REDACTED>"))
            .field("alert_hmac_secret", &self.alert_hmac_secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

struct SecretEnvNames {
    broker_credentials_key_var: String,
    alert_shared_token_var: String,
    alert_hmac_secret_var: String,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        broker_credentials_key_var: read_str_at(config_json, "/secrets/broker_credentials_key_env")
            .unwrap_or_else(|| "TC_BROKER_CREDENTIALS_KEY".to_string()),
        alert_shared_token_var: read_str_at(config_json, "/secrets/alert_shared_token_env")
            .unwrap_or_else(|| "TC_ALERT_SHARED_TOKEN".to_string()),
        alert_hmac_secret_var: read_str_at(config_json, "/secrets/alert_hmac_secret_env")
            .unwrap_or_else(|| "TC_ALERT_HMAC_SECRET".to_string()),
    }
}

/// Resolve all secrets from the environment for the given mode.
///
/// Returns `Err` naming the first missing required env var; the value is
/// never part of the error.
pub fn resolve_secrets_for_mode(config_json: &Value, mode: RunMode) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let broker_credentials_key = resolve_env(&names.broker_credentials_key_var);
    let alert_shared_token = resolve_env(&names.alert_shared_token_var);
    let alert_hmac_secret = resolve_env(&names.alert_hmac_secret_var);

    if mode == RunMode::Live && broker_credentials_key.is_none() {
        bail!(
            "SECRETS_MISSING mode=LIVE: required env var '{}' (broker credentials key) is not set or empty",
            names.broker_credentials_key_var,
        );
    }

    Ok(ResolvedSecrets { broker_credentials_key, alert_shared_token, alert_hmac_secret })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn live_mode_requires_the_credentials_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TC_BROKER_CREDENTIALS_KEY");
        let err = resolve_secrets_for_mode(&json!({}), RunMode::Live).unwrap_err();
        assert!(err.to_string().contains("TC_BROKER_CREDENTIALS_KEY"));
    }

    #[test]
    fn paper_mode_needs_nothing() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TC_BROKER_CREDENTIALS_KEY");
        assert!(resolve_secrets_for_mode(&json!({}), RunMode::Paper).is_ok());
    }

    #[test]
    fn debug_output_never_prints_the_resolved_value() {
        let secrets = ResolvedSecrets {
            broker_credentials_key: Some("super-secret".to_string()),
            alert_shared_token: None,
            alert_hmac_secret: None,
        };
        let rendered = format!("{secrets:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn unknown_mode_string_is_rejected() {
        assert!(RunMode::parse("staging").is_err());
    }
}
