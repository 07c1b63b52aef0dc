//! Protocol parameter sets.
//!
//! The launch platform's curve constants are carried in an explicit value
//! passed to the engine at construction, so tests can run against variant
//! parameter sets (e.g. a testnet with a lower migration threshold).

use serde::{Deserialize, Serialize};

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Base units per token (the launch platform mints with 6 decimals).
pub const TOKEN_BASE_UNITS: u64 = 1_000_000;

/// Constants describing one deployment of the bonding-curve program.
///
/// All amounts are in smallest units: lamports for the base asset, 6-decimal
/// base units for the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Real base reserves at which the curve completes and trading migrates.
    pub migration_threshold: u64,
    /// Virtual base reserves seeded at token creation.
    pub initial_virtual_base: u64,
    /// Virtual token reserves seeded at token creation.
    pub initial_virtual_tokens: u64,
    /// Real token reserves available for sale on the curve.
    pub initial_real_tokens: u64,
    /// Total token supply, used for market-cap computation.
    pub total_supply: u64,
}

impl Default for CurveParams {
    /// Mainnet parameters of the launch platform.
    fn default() -> Self {
        Self {
            migration_threshold: 85 * LAMPORTS_PER_SOL,
            initial_virtual_base: 30 * LAMPORTS_PER_SOL,
            initial_virtual_tokens: 1_073_000_000 * TOKEN_BASE_UNITS,
            initial_real_tokens: 1_000_000_000 * TOKEN_BASE_UNITS,
            total_supply: 1_000_000_000 * TOKEN_BASE_UNITS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_defaults() {
        let params = CurveParams::default();
        assert_eq!(params.migration_threshold, 85_000_000_000);
        assert_eq!(params.initial_virtual_base, 30_000_000_000);
        assert_eq!(params.initial_virtual_tokens, 1_073_000_000_000_000);
        assert_eq!(params.total_supply, 1_000_000_000_000_000);
    }
}
