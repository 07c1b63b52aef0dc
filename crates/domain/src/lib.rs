//! Pure domain types and math for bonding-curve trading.
//!
//! This crate contains the deterministic core of the bot:
//! - Constant-product bonding-curve state and quote computation
//! - The per-trade position state machine and exit policies
//! - Protocol parameter sets and the shared error taxonomy
//!
//! No I/O, no clocks, no async. Callers supply timestamps and reserve
//! snapshots; every computation returns new values instead of mutating
//! shared state.

/// Prelude module for convenient imports.
pub mod prelude;

/// Bonding-curve state and quote engine.
pub mod curve;
/// Error taxonomy shared across the workspace.
pub mod errors;
/// Protocol parameter sets.
pub mod params;
/// Position state machine and exit policies.
pub mod position;
/// Token identity as delivered by the discovery feed.
pub mod token;
