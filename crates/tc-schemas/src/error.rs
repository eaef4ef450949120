use thiserror::Error;

/// The shared error type for every library crate in this workspace.
/// Binaries (`tc-daemon`, `tc-cli`) wrap this in `anyhow::Error` at the
/// boundary; library code never reaches for `anyhow`.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transient broker failure: {0}")]
    TransientBroker(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("risk rejection: {0}")]
    RiskRejection(String),

    #[error("invalid order state transition: {from} -> {to}")]
    OrderState { from: String, to: String },

    #[error("accounting error: {0}")]
    Accounting(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn risk<S: Into<String>>(msg: S) -> Self {
        DomainError::RiskRejection(msg.into())
    }
}
