//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use pump_trader_domain::prelude::*;
//! ```

// Curve
pub use crate::curve::{BuyQuote, CurveEngine, CurveModel, SellQuote};

// Errors
pub use crate::errors::{CurveError, PositionError};

// Params
pub use crate::params::{CurveParams, LAMPORTS_PER_SOL, TOKEN_BASE_UNITS};

// Position
pub use crate::position::{
    ExitCheck, ExitReason, ExitStrategy, HoldReason, Position, PositionId, PositionStatus,
    TradeResult,
};

// Token
pub use crate::token::TokenHandle;
