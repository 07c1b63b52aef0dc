//! Chain collaborators for the bonding-curve launch platform.
//!
//! Everything that touches the wire lives here: RPC access, program
//! address derivation, instruction byte encoding, curve account decoding,
//! creation-event parsing and key management. The execution crate talks
//! to this crate only through the traits below, so trading logic stays
//! testable without a validator.

pub mod pump;
pub mod rpc;
pub mod wallet;

use async_trait::async_trait;
use pump_trader_domain::prelude::{BuyQuote, CurveModel, SellQuote, TokenHandle, TradeResult};
use serde::{Deserialize, Serialize};

use anyhow::Result;

/// Read access to bonding-curve state. Implementations must be safe for
/// concurrent use; every monitor polls through a shared instance.
#[async_trait]
pub trait CurveSource: Send + Sync {
    /// Fetches and decodes the current reserve snapshot of a bonding curve.
    async fn fetch_curve(&self, bonding_curve: &str) -> Result<CurveModel>;
}

/// Buy and sell execution against the launch platform's program.
///
/// Quotes are pre-computed by the caller; implementations apply their
/// configured slippage tolerance, encode, sign and submit. Both methods
/// return a failed [`TradeResult`] for rejected submissions rather than
/// an `Err`, reserving errors for conditions where no attempt reached
/// the chain (bad addresses, no blockhash).
#[async_trait]
pub trait CurveTrader: Send + Sync {
    /// Buys the quoted token amount, spending at most the quoted base
    /// amount plus slippage tolerance.
    async fn buy(&self, token: &TokenHandle, quote: &BuyQuote) -> Result<TradeResult>;

    /// Sells the quoted token amount, accepting no less than the quoted
    /// base amount minus slippage tolerance.
    async fn sell(&self, token: &TokenHandle, quote: &SellQuote) -> Result<TradeResult>;
}

/// Outcome of a rent-reclaim attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub success: bool,
    /// Lamports recovered by closing the account.
    pub base_recovered: u64,
    pub error: Option<String>,
}

/// Best-effort reclamation of rent held by empty token accounts.
#[async_trait]
pub trait RentReclaimer: Send + Sync {
    /// Closes the caller's associated token account for `token`'s mint if
    /// it is empty, returning its rent lamports to the wallet.
    async fn reclaim_rent(&self, token: &TokenHandle) -> Result<CleanupReport>;
}

/// Wallet-level queries the orchestrator needs before committing funds.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Lamport balance of the trading wallet.
    async fn wallet_balance(&self) -> Result<u64>;
}
