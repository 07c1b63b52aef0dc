use thiserror::Error;

/// Errors produced by the curve engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    /// Caller violated a precondition (zero amount, completed curve).
    /// Never retried; treated as a programming error by the orchestrator.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reserves cannot satisfy the trade even after clamping. Retrying the
    /// same amount will not help.
    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    /// Reserve arithmetic overflowed u128. Indicates corrupt on-chain data
    /// rather than a recoverable trading condition.
    #[error("reserve arithmetic overflow")]
    Overflow,
}

/// Errors produced by position state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// A transition was requested from a state that does not allow it.
    #[error("invalid transition: {op} while position is {status}")]
    InvalidTransition { op: &'static str, status: String },

    /// Price update on a position that is not being monitored.
    #[error("position is not monitoring, cannot update price")]
    NotMonitoring,
}
