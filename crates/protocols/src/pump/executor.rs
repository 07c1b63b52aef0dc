//! Trade executor for the launch platform.
//!
//! Turns pre-computed quotes into signed transactions:
//! - Buy tokens on a bonding curve
//! - Sell tokens back to the curve
//! - Reclaim rent from emptied token accounts
//!
//! The executor owns the trading wallet and applies its configured
//! slippage tolerance; quote math stays with the caller.

use crate::pump::addresses::{parse_pubkey, ProgramAddresses};
use crate::pump::curve_account::BondingCurveAccount;
use crate::pump::instructions::{slippage_bounds, InstructionEncoder, TradeAccounts};
use crate::rpc::RpcProvider;
use crate::wallet::Wallet;
use crate::{BalanceSource, CleanupReport, CurveSource, CurveTrader, RentReclaimer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use pump_trader_domain::prelude::{BuyQuote, CurveModel, SellQuote, TokenHandle, TradeResult};
use solana_sdk::{instruction::Instruction, transaction::Transaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Executor for bonding-curve trades.
pub struct PumpExecutor {
    provider: Arc<RpcProvider>,
    wallet: Arc<Wallet>,
    addresses: ProgramAddresses,
    encoder: InstructionEncoder,
    /// Slippage tolerance applied to quoted base amounts (0.05 = 5%).
    slippage_tolerance: f64,
    /// Bound on each confirmation wait; `None` defers to the RPC client.
    confirm_timeout: Option<Duration>,
}

impl PumpExecutor {
    pub fn new(
        provider: Arc<RpcProvider>,
        wallet: Arc<Wallet>,
        addresses: ProgramAddresses,
        slippage_tolerance: f64,
        confirm_timeout: Option<Duration>,
    ) -> Self {
        Self {
            provider,
            wallet,
            addresses,
            encoder: InstructionEncoder::new(addresses),
            slippage_tolerance,
            confirm_timeout,
        }
    }

    fn trade_accounts(&self, token: &TokenHandle) -> Result<TradeAccounts> {
        let mint = parse_pubkey(&token.mint)?;
        Ok(TradeAccounts {
            mint,
            bonding_curve: parse_pubkey(&token.bonding_curve)?,
            associated_bonding_curve: parse_pubkey(&token.associated_bonding_curve)?,
            associated_user: self.addresses.associated_token_account(&self.wallet.pubkey(), &mint),
            user: self.wallet.pubkey(),
        })
    }

    async fn send_transaction(&self, instructions: &[Instruction]) -> Result<TradeResult> {
        let recent_blockhash = self.provider.get_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.wallet.pubkey()),
            &[self.wallet.keypair()],
            recent_blockhash,
        );

        let now = Utc::now().timestamp_millis();
        match self
            .provider
            .send_and_confirm_transaction(&transaction, self.confirm_timeout)
            .await
        {
            Ok(signature) => {
                info!(signature = %signature, "Transaction confirmed");
                Ok(TradeResult {
                    success: true,
                    signature: Some(signature.to_string()),
                    error: None,
                    amount: None,
                    price: None,
                    timestamp: now,
                })
            }
            Err(e) => {
                warn!(error = %e, "Transaction rejected");
                Ok(TradeResult::failed(e.to_string(), now))
            }
        }
    }
}

#[async_trait]
impl CurveSource for PumpExecutor {
    async fn fetch_curve(&self, bonding_curve: &str) -> Result<CurveModel> {
        let address = parse_pubkey(bonding_curve)?;
        let data = self.provider.get_account_data(&address).await?;
        Ok(BondingCurveAccount::decode(&data)?.to_model())
    }
}

#[async_trait]
impl CurveTrader for PumpExecutor {
    async fn buy(&self, token: &TokenHandle, quote: &BuyQuote) -> Result<TradeResult> {
        let (token_amount, base_in) = buy_amounts(quote)?;
        let (_, max_base_cost) = slippage_bounds(base_in, self.slippage_tolerance);
        let accounts = self.trade_accounts(token)?;

        info!(
            mint = %token.mint,
            token_amount,
            max_base_cost,
            "Submitting buy"
        );

        let mut instructions = Vec::with_capacity(2);
        if !self.provider.account_exists(&accounts.associated_user).await? {
            instructions.push(self.encoder.create_associated_token_account(
                &accounts.user,
                &accounts.user,
                &accounts.mint,
            ));
        }
        instructions.push(self.encoder.buy(&accounts, token_amount, max_base_cost));

        let mut result = self.send_transaction(&instructions).await?;
        if result.success {
            result.amount = Some(token_amount as f64);
            result.price = Some(quote.effective_price);
        }
        Ok(result)
    }

    async fn sell(&self, token: &TokenHandle, quote: &SellQuote) -> Result<TradeResult> {
        let (token_amount, base_out) = sell_amounts(quote)?;
        let (min_base_out, _) = slippage_bounds(base_out, self.slippage_tolerance);
        let accounts = self.trade_accounts(token)?;

        info!(
            mint = %token.mint,
            token_amount,
            min_base_out,
            "Submitting sell"
        );

        let instruction = self.encoder.sell(&accounts, token_amount, min_base_out);
        let mut result = self.send_transaction(&[instruction]).await?;
        if result.success {
            result.amount = Some(base_out as f64);
            result.price = Some(quote.effective_price);
        }
        Ok(result)
    }
}

#[async_trait]
impl RentReclaimer for PumpExecutor {
    async fn reclaim_rent(&self, token: &TokenHandle) -> Result<CleanupReport> {
        let mint = parse_pubkey(&token.mint)?;
        let account = self
            .addresses
            .associated_token_account(&self.wallet.pubkey(), &mint);

        if !self.provider.account_exists(&account).await? {
            return Ok(CleanupReport {
                success: true,
                base_recovered: 0,
                error: None,
            });
        }

        // Closing a non-empty account would burn the remaining tokens.
        let token_balance = self.provider.get_token_account_balance(&account).await?;
        if token_balance > 0 {
            warn!(account = %account, token_balance, "Refusing to close non-empty token account");
            return Ok(CleanupReport {
                success: false,
                base_recovered: 0,
                error: Some(format!("token account holds {token_balance} base units")),
            });
        }

        let rent = self.provider.get_balance(&account).await?;
        let instruction = self
            .encoder
            .close_token_account(&account, &self.wallet.pubkey())?;
        let result = self.send_transaction(&[instruction]).await?;

        if result.success {
            info!(account = %account, rent, "Token account closed, rent reclaimed");
            Ok(CleanupReport {
                success: true,
                base_recovered: rent,
                error: None,
            })
        } else {
            Ok(CleanupReport {
                success: false,
                base_recovered: 0,
                error: result.error,
            })
        }
    }
}

#[async_trait]
impl BalanceSource for PumpExecutor {
    async fn wallet_balance(&self) -> Result<u64> {
        self.provider.get_balance(&self.wallet.pubkey()).await
    }
}

fn buy_amounts(quote: &BuyQuote) -> Result<(u64, u64)> {
    let tokens = u64::try_from(quote.tokens_out).context("quoted token amount exceeds u64")?;
    let base = u64::try_from(quote.base_in).context("quoted base amount exceeds u64")?;
    Ok((tokens, base))
}

fn sell_amounts(quote: &SellQuote) -> Result<(u64, u64)> {
    let tokens = u64::try_from(quote.tokens_in).context("quoted token amount exceeds u64")?;
    let base = u64::try_from(quote.base_out).context("quoted base amount exceeds u64")?;
    Ok((tokens, base))
}
