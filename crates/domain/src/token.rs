//! Token identity as delivered by the discovery feed.

use serde::{Deserialize, Serialize};

/// Identifies a tradable token on the launch platform.
///
/// All addresses are base58 strings taken verbatim from the creation
/// event; the discovery feed is the authoritative source for the PDAs at
/// creation time, so nothing here is re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHandle {
    /// Token mint address.
    pub mint: String,
    /// Human-readable token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Creator wallet address.
    pub creator: String,
    /// Bonding-curve account address.
    pub bonding_curve: String,
    /// The curve's associated token account address.
    pub associated_bonding_curve: String,
}

impl TokenHandle {
    /// Basic sanity check on a handle parsed from chain data: non-empty
    /// identifiers and bounded metadata lengths.
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        !self.mint.is_empty()
            && !self.bonding_curve.is_empty()
            && !self.associated_bonding_curve.is_empty()
            && !self.symbol.is_empty()
            && self.name.len() <= 100
            && self.symbol.len() <= 20
    }
}
