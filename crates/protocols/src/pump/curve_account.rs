//! On-chain bonding-curve account decoding.

use anyhow::{bail, Context, Result};
use borsh::BorshDeserialize;
use pump_trader_domain::prelude::CurveModel;

/// Account discriminator of bonding-curve state accounts, little-endian.
pub const CURVE_ACCOUNT_DISCRIMINATOR: u64 = 6_966_180_631_402_821_399;

/// Raw bonding-curve account body, after the 8-byte discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshDeserialize)]
pub struct BondingCurveAccount {
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
}

impl BondingCurveAccount {
    /// Decodes account data fetched over RPC, checking the discriminator
    /// before deserializing the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            bail!("curve account too short: {} bytes", data.len());
        }
        let discriminator = u64::from_le_bytes(data[..8].try_into().expect("checked length"));
        if discriminator != CURVE_ACCOUNT_DISCRIMINATOR {
            bail!("unexpected curve account discriminator: {discriminator}");
        }
        let mut body = &data[8..];
        BondingCurveAccount::deserialize(&mut body).context("malformed curve account body")
    }

    /// Converts the raw account into the domain reserve snapshot.
    #[must_use]
    pub fn to_model(&self) -> CurveModel {
        CurveModel {
            virtual_base_reserves: u128::from(self.virtual_sol_reserves),
            virtual_token_reserves: u128::from(self.virtual_token_reserves),
            real_base_reserves: u128::from(self.real_sol_reserves),
            real_token_reserves: u128::from(self.real_token_reserves),
            is_complete: self.complete,
        }
    }
}
