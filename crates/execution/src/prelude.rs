//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use pump_trader_execution::prelude::*;
//! ```

// Book
pub use crate::book::{BookSummary, PositionBook};

// Errors
pub use crate::errors::ExecutionError;

// Feed
pub use crate::feed::{token_feed, TokenReceiver, TokenSender};

// Monitor
pub use crate::monitor::{MonitorOutcome, MonitoringConfig, PositionMonitor};

// Orchestrator
pub use crate::orchestrator::{Collaborators, TradeOrchestrator, TradingConfig};
