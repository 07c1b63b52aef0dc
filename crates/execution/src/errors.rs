use thiserror::Error;

/// Errors raised by the execution layer before any trade is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A configuration value fails validation. Raised at construction
    /// time so a misconfigured bot never reaches the chain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The wallet cannot fund the configured buy amount.
    #[error("insufficient wallet balance: have {available} lamports, need {required}")]
    InsufficientBalance { available: u64, required: u64 },
}
