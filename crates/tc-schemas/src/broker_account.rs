use serde::{Deserialize, Serialize};

/// A broker login the system can route orders through. `credentials` is
/// opaque ciphertext from this crate's point of view — decryption happens
/// in `tc-broker` at the moment a session is opened, never earlier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrokerAccount {
    pub id: uuid::Uuid,
    pub broker_code: String,
    pub credentials: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub base_currency: String,
    pub leverage: i32,
}

impl BrokerAccount {
    /// True when this account belongs to the MT5 family, where the
    /// single-terminal-session invariant applies.
    pub fn is_mt5_family(&self) -> bool {
        self.broker_code.eq_ignore_ascii_case("mt5")
    }
}
