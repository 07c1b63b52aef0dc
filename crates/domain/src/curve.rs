//! Constant-product bonding-curve state and quote engine.
//!
//! All reserve arithmetic is integer-only (`u128`, smallest units).
//! Floating point appears only in derived ratios (prices, slippage,
//! market cap) that are never fed back into reserve math. Every quote
//! returns a *new* [`CurveModel`]; snapshots are never mutated in place,
//! which makes the engine safe for concurrent use by multiple monitors.

use crate::errors::CurveError;
use crate::params::CurveParams;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a bonding curve's reserve state.
///
/// Constructed either from the protocol's creation-time constants
/// ([`CurveModel::initial`]) or from an on-chain account fetched at trade
/// time. Each trade computation supersedes the snapshot with a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveModel {
    /// Virtual base-asset reserves (lamports).
    pub virtual_base_reserves: u128,
    /// Virtual token reserves (token base units).
    pub virtual_token_reserves: u128,
    /// Real base-asset reserves accumulated by the curve (lamports).
    pub real_base_reserves: u128,
    /// Real token reserves still available for sale (token base units).
    pub real_token_reserves: u128,
    /// True once real base reserves reached the migration threshold.
    pub is_complete: bool,
}

impl CurveModel {
    /// Reserve state of a freshly created token, before any trade.
    #[must_use]
    pub fn initial(params: &CurveParams) -> Self {
        Self {
            virtual_base_reserves: u128::from(params.initial_virtual_base),
            virtual_token_reserves: u128::from(params.initial_virtual_tokens),
            real_base_reserves: 0,
            real_token_reserves: u128::from(params.initial_real_tokens),
            is_complete: false,
        }
    }

    /// The constant product `k = virtual_base * virtual_token`.
    fn product(&self) -> Result<u128, CurveError> {
        self.virtual_base_reserves
            .checked_mul(self.virtual_token_reserves)
            .ok_or(CurveError::Overflow)
    }
}

/// Result of a buy quote.
///
/// `base_in` is the amount actually consumed: when the requested amount
/// would exceed the remaining real token reserves, the trade is clamped
/// and the input re-solved through the same k-relationship, so `base_in`
/// can be smaller than the requested amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyQuote {
    /// Tokens received (token base units).
    pub tokens_out: u128,
    /// Base amount actually consumed (lamports).
    pub base_in: u128,
    /// Average price paid, lamports per token base unit.
    pub effective_price: f64,
    /// Reserve state after the trade.
    pub new_curve: CurveModel,
}

/// Result of a sell quote. Mirror of [`BuyQuote`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellQuote {
    /// Base amount received (lamports).
    pub base_out: u128,
    /// Tokens actually consumed (token base units).
    pub tokens_in: u128,
    /// Average price received, lamports per token base unit.
    pub effective_price: f64,
    /// Reserve state after the trade.
    pub new_curve: CurveModel,
}

/// Stateless quote engine over [`CurveModel`] snapshots.
///
/// Holds only the protocol parameter set; all methods are deterministic
/// functions of their inputs.
#[derive(Debug, Clone, Copy)]
pub struct CurveEngine {
    params: CurveParams,
}

impl CurveEngine {
    /// Creates an engine for the given protocol parameters.
    #[must_use]
    pub fn new(params: CurveParams) -> Self {
        Self { params }
    }

    /// The protocol parameters this engine was constructed with.
    #[must_use]
    pub fn params(&self) -> &CurveParams {
        &self.params
    }

    /// Quotes a buy of tokens for `base_in` lamports.
    ///
    /// Constant-product transfer: token-out is rounded down by the integer
    /// division, matching on-chain rounding that favors the protocol. If the
    /// computed token-out exceeds the remaining real token reserves it is
    /// clamped to them and `base_in` is re-solved from the clamped amount;
    /// callers must use the returned `base_in`, not the requested one.
    pub fn quote_buy(&self, curve: &CurveModel, base_in: u128) -> Result<BuyQuote, CurveError> {
        if base_in == 0 {
            return Err(CurveError::InvalidInput("buy amount must be positive".into()));
        }
        if curve.is_complete {
            return Err(CurveError::InvalidInput("curve is complete".into()));
        }
        if curve.virtual_token_reserves == 0 {
            return Err(CurveError::InsufficientLiquidity("no virtual token reserves".into()));
        }

        let k = curve.product()?;

        let mut new_virtual_base = curve
            .virtual_base_reserves
            .checked_add(base_in)
            .ok_or(CurveError::Overflow)?;
        let mut new_virtual_tokens = k / new_virtual_base;
        let mut tokens_out = curve.virtual_token_reserves - new_virtual_tokens;
        let mut base_in = base_in;

        // A buy can never take more than the real supply still on the curve.
        // Clamp and re-solve the input through the same k so the returned
        // amounts stay consistent with each other.
        if tokens_out > curve.real_token_reserves {
            tokens_out = curve.real_token_reserves;
            let required_virtual_tokens = curve.virtual_token_reserves - tokens_out;
            if required_virtual_tokens == 0 {
                return Err(CurveError::InsufficientLiquidity(
                    "clamped trade would drain virtual token reserves".into(),
                ));
            }
            let required_virtual_base = k / required_virtual_tokens;
            base_in = required_virtual_base - curve.virtual_base_reserves;
            new_virtual_base = required_virtual_base;
            new_virtual_tokens = required_virtual_tokens;
        }

        if tokens_out == 0 {
            return Err(CurveError::InsufficientLiquidity(
                "buy amount too small for any token output".into(),
            ));
        }
        if base_in == 0 {
            return Err(CurveError::InsufficientLiquidity(
                "no real token reserves remaining".into(),
            ));
        }

        let new_real_base = curve
            .real_base_reserves
            .checked_add(base_in)
            .ok_or(CurveError::Overflow)?;

        Ok(BuyQuote {
            tokens_out,
            base_in,
            effective_price: base_in as f64 / tokens_out as f64,
            new_curve: CurveModel {
                virtual_base_reserves: new_virtual_base,
                virtual_token_reserves: new_virtual_tokens,
                real_base_reserves: new_real_base,
                real_token_reserves: curve.real_token_reserves - tokens_out,
                is_complete: new_real_base >= u128::from(self.params.migration_threshold),
            },
        })
    }

    /// Quotes a sell of `tokens_in` token base units.
    ///
    /// Base-out is rounded down (the new virtual base reserve rounds up),
    /// clamped to the curve's real base reserves. Selling never completes
    /// the curve.
    pub fn quote_sell(&self, curve: &CurveModel, tokens_in: u128) -> Result<SellQuote, CurveError> {
        if tokens_in == 0 {
            return Err(CurveError::InvalidInput("sell amount must be positive".into()));
        }
        if curve.is_complete {
            return Err(CurveError::InvalidInput("curve is complete".into()));
        }

        let k = curve.product()?;

        let mut new_virtual_tokens = curve
            .virtual_token_reserves
            .checked_add(tokens_in)
            .ok_or(CurveError::Overflow)?;
        let mut new_virtual_base = k.div_ceil(new_virtual_tokens);
        let mut base_out = curve.virtual_base_reserves.saturating_sub(new_virtual_base);
        let mut tokens_in = tokens_in;

        // Cannot pay out more base than the curve actually holds.
        if base_out > curve.real_base_reserves {
            base_out = curve.real_base_reserves;
            let required_virtual_base = curve.virtual_base_reserves - base_out;
            let required_virtual_tokens = k.div_ceil(required_virtual_base);
            tokens_in = required_virtual_tokens - curve.virtual_token_reserves;
            new_virtual_base = required_virtual_base;
            new_virtual_tokens = required_virtual_tokens;
        }

        if base_out == 0 {
            return Err(CurveError::InsufficientLiquidity(
                "sell amount too small for any base output".into(),
            ));
        }
        if tokens_in == 0 {
            return Err(CurveError::InsufficientLiquidity(
                "no real base reserves remaining".into(),
            ));
        }

        Ok(SellQuote {
            base_out,
            tokens_in,
            effective_price: base_out as f64 / tokens_in as f64,
            new_curve: CurveModel {
                virtual_base_reserves: new_virtual_base,
                virtual_token_reserves: new_virtual_tokens,
                real_base_reserves: curve.real_base_reserves - base_out,
                real_token_reserves: curve
                    .real_token_reserves
                    .checked_add(tokens_in)
                    .ok_or(CurveError::Overflow)?,
                is_complete: false,
            },
        })
    }

    /// Spot price in lamports per token base unit.
    ///
    /// Returns `0.0` when virtual token reserves are zero; the invariants
    /// make that unreachable for curves observed on chain.
    #[must_use]
    pub fn spot_price(&self, curve: &CurveModel) -> f64 {
        if curve.virtual_token_reserves == 0 {
            return 0.0;
        }
        curve.virtual_base_reserves as f64 / curve.virtual_token_reserves as f64
    }

    /// Market capitalization in lamports: spot price times total supply.
    #[must_use]
    pub fn market_cap(&self, curve: &CurveModel) -> f64 {
        self.spot_price(curve) * self.params.total_supply as f64
    }

    /// Estimates slippage for a trade of `amount` as the relative difference
    /// between the effective price of a trade sized at 1% of `amount` and
    /// the full amount.
    ///
    /// Advisory only: returns `0.0` on any internal failure rather than
    /// propagating an error.
    #[must_use]
    pub fn estimate_slippage(&self, curve: &CurveModel, amount: u128, is_buy: bool) -> f64 {
        let small = (amount / 100).max(1);

        let prices = if is_buy {
            let small_quote = self.quote_buy(curve, small);
            let full_quote = self.quote_buy(curve, amount);
            small_quote
                .and_then(|s| full_quote.map(|f| (s.effective_price, f.effective_price)))
        } else {
            let small_quote = self.quote_sell(curve, small);
            let full_quote = self.quote_sell(curve, amount);
            small_quote
                .and_then(|s| full_quote.map(|f| (s.effective_price, f.effective_price)))
        };

        match prices {
            Ok((price_small, price_full)) if price_small > 0.0 => {
                (price_full - price_small).abs() / price_small
            }
            _ => 0.0,
        }
    }

    /// Progress toward migration, `0.0..=1.0`.
    #[must_use]
    pub fn migration_progress(&self, curve: &CurveModel) -> f64 {
        if self.params.migration_threshold == 0 {
            return 0.0;
        }
        let progress = curve.real_base_reserves as f64 / self.params.migration_threshold as f64;
        progress.min(1.0)
    }
}
