//! Launch platform protocol adapter.
//!
//! This module provides everything needed to trade on the bonding-curve
//! program:
//! - Static addresses and PDA derivation
//! - Instruction byte encoding
//! - On-chain curve account decoding
//! - Token creation event parsing
//! - The trade executor tying them together

/// Program addresses and PDA derivation.
pub mod addresses;
/// On-chain curve account decoding.
pub mod curve_account;
/// Token creation event parsing.
pub mod events;
/// Trade executor for on-chain operations.
pub mod executor;
/// Instruction byte encoding.
pub mod instructions;
