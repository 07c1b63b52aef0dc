//! Trade orchestration: buy, monitor, sell, cleanup.
//!
//! One orchestrator consumes the discovery feed and runs each token
//! through the full pipeline in its own task, bounded by a position cap.
//! Numeric work is delegated to the curve engine and the position state
//! machine; all I/O goes through the collaborator traits, so the whole
//! pipeline runs against mocks in tests.

use crate::book::PositionBook;
use crate::errors::ExecutionError;
use crate::feed::TokenReceiver;
use crate::monitor::{MonitoringConfig, PositionMonitor};
use anyhow::{Context, Result};
use chrono::Utc;
use pump_trader_domain::prelude::{
    CurveEngine, ExitStrategy, Position, TokenHandle, TradeResult,
};
use pump_trader_protocols::{BalanceSource, CurveSource, CurveTrader, RentReclaimer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything the pipeline needs from a trading run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Lamports committed per buy.
    pub buy_amount_base: u64,
    /// Exit policy attached to every position.
    pub exit_strategy: ExitStrategy,
    /// Monitoring timing budget.
    pub monitoring: MonitoringConfig,
    /// Submission attempts per transaction before giving up.
    pub max_submit_attempts: u32,
    /// Fixed delay between submission attempts.
    pub retry_delay: Duration,
    /// Positions allowed in flight at once.
    pub max_concurrent_positions: usize,
    /// Lamports kept untouched for fees and rent.
    pub balance_headroom: u64,
}

impl TradingConfig {
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.buy_amount_base == 0 {
            return Err(ExecutionError::InvalidConfig(
                "buy_amount_base must be greater than zero".into(),
            ));
        }
        if self.max_submit_attempts == 0 {
            return Err(ExecutionError::InvalidConfig(
                "max_submit_attempts must be at least 1".into(),
            ));
        }
        if self.max_concurrent_positions == 0 {
            return Err(ExecutionError::InvalidConfig(
                "max_concurrent_positions must be at least 1".into(),
            ));
        }
        self.monitoring.validate()
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            buy_amount_base: 10_000_000,
            exit_strategy: ExitStrategy::TakeProfitStopLoss {
                take_profit_pct: 0.5,
                stop_loss_pct: 0.2,
            },
            monitoring: MonitoringConfig::default(),
            max_submit_attempts: 3,
            retry_delay: Duration::from_secs(1),
            max_concurrent_positions: 3,
            balance_headroom: 5_000_000,
        }
    }
}

/// External collaborators the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn CurveSource>,
    pub trader: Arc<dyn CurveTrader>,
    pub reclaimer: Arc<dyn RentReclaimer>,
    pub balance: Arc<dyn BalanceSource>,
}

/// Runs discovered tokens through buy, monitor, sell and cleanup.
pub struct TradeOrchestrator {
    config: TradingConfig,
    engine: CurveEngine,
    collaborators: Collaborators,
    book: Arc<PositionBook>,
    slots: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl TradeOrchestrator {
    pub fn new(
        config: TradingConfig,
        engine: CurveEngine,
        collaborators: Collaborators,
        cancel: CancellationToken,
    ) -> Result<Self, ExecutionError> {
        config.validate()?;
        let slots = Arc::new(Semaphore::new(config.max_concurrent_positions));
        Ok(Self {
            config,
            engine,
            collaborators,
            book: Arc::new(PositionBook::new()),
            slots,
            cancel,
        })
    }

    /// The shared position book.
    #[must_use]
    pub fn book(&self) -> Arc<PositionBook> {
        Arc::clone(&self.book)
    }

    /// Consumes the discovery feed until it closes or the orchestrator is
    /// cancelled. Each token trades in its own task; the position cap is
    /// applied before a token is accepted, so a full book backpressures
    /// the feed instead of spawning unbounded work.
    pub async fn run(self: Arc<Self>, mut feed: TokenReceiver) -> Result<()> {
        let mut tasks = JoinSet::new();

        loop {
            let token = tokio::select! {
                _ = self.cancel.cancelled() => break,
                token = feed.recv() => match token {
                    Some(token) => token,
                    None => break,
                },
            };

            let permit = tokio::select! {
                _ = self.cancel.cancelled() => break,
                permit = Arc::clone(&self.slots).acquire_owned() => {
                    permit.context("position slots closed")?
                }
            };

            let orchestrator = Arc::clone(&self);
            tasks.spawn(async move {
                let mint = token.mint.clone();
                if let Err(e) = orchestrator.trade_token(token).await {
                    error!(mint = %mint, error = %e, "Trade pipeline failed");
                }
                drop(permit);
            });
        }

        info!("Feed closed, waiting for in-flight positions");
        while tasks.join_next().await.is_some() {}
        self.book.log_summary().await;
        Ok(())
    }

    /// Runs the full pipeline for one token and returns the terminal
    /// position. Errors mean the pipeline stopped before reaching a
    /// terminal state it could record (bad quote, invalid addresses).
    pub async fn trade_token(&self, token: TokenHandle) -> Result<Position> {
        let balance = self.collaborators.balance.wallet_balance().await?;
        let required = self.config.buy_amount_base + self.config.balance_headroom;
        if balance < required {
            return Err(ExecutionError::InsufficientBalance {
                available: balance,
                required,
            }
            .into());
        }

        let model = self
            .collaborators
            .source
            .fetch_curve(&token.bonding_curve)
            .await?;
        let quote = self
            .engine
            .quote_buy(&model, u128::from(self.config.buy_amount_base))
            .context("buy quote rejected")?;

        info!(
            mint = %token.mint,
            symbol = %token.symbol,
            base_in = quote.base_in as u64,
            tokens_out = quote.tokens_out as u64,
            price = quote.effective_price,
            "Opening position"
        );

        let mut position = Position::new(
            token.clone(),
            self.config.buy_amount_base,
            self.config.exit_strategy,
            now_ms(),
        );
        self.book.upsert(position.clone()).await;

        let buy_result = self.buy_with_retry(&token, &quote).await;
        position.apply_buy_result(buy_result, now_ms())?;
        self.book.upsert(position.clone()).await;

        if !position.status.is_terminal() {
            let monitor = PositionMonitor::new(
                self.config.monitoring,
                Arc::clone(&self.collaborators.source),
                self.engine,
                self.cancel.child_token(),
            )?;
            let outcome = monitor.run(&mut position).await?;
            self.book.upsert(position.clone()).await;

            self.unwind(&mut position, outcome.reason).await?;
        }

        Ok(position)
    }

    /// Sells the position and reclaims rent. The sell decides the
    /// terminal state; cleanup is best effort either way.
    async fn unwind(
        &self,
        position: &mut Position,
        reason: pump_trader_domain::prelude::ExitReason,
    ) -> Result<()> {
        let token = position.token.clone();
        let tokens_in = position.token_balance as u128;

        let sell_quote = match self
            .collaborators
            .source
            .fetch_curve(&token.bonding_curve)
            .await
            .and_then(|model| Ok(self.engine.quote_sell(&model, tokens_in)?))
        {
            Ok(quote) => quote,
            Err(e) => {
                warn!(mint = %token.mint, error = %e, "Sell quote failed, marking position failed");
                position.fail(now_ms())?;
                self.book.upsert(position.clone()).await;
                return Ok(());
            }
        };

        info!(
            mint = %token.mint,
            ?reason,
            tokens_in = sell_quote.tokens_in as u64,
            base_out = sell_quote.base_out as u64,
            "Closing position"
        );

        position.mark_selling(now_ms())?;
        self.book.upsert(position.clone()).await;

        let sell_result = self.sell_with_retry(&token, &sell_quote).await;
        position.apply_sell_result(sell_result, now_ms())?;
        self.book.upsert(position.clone()).await;

        match self.collaborators.reclaimer.reclaim_rent(&token).await {
            Ok(report) if report.success => {
                info!(mint = %token.mint, recovered = report.base_recovered, "Rent reclaimed");
            }
            Ok(report) => {
                warn!(mint = %token.mint, error = ?report.error, "Rent reclaim skipped");
            }
            Err(e) => {
                warn!(mint = %token.mint, error = %e, "Rent reclaim failed");
            }
        }

        Ok(())
    }

    async fn buy_with_retry(
        &self,
        token: &TokenHandle,
        quote: &pump_trader_domain::prelude::BuyQuote,
    ) -> TradeResult {
        let mut last = TradeResult::failed("no attempt made", now_ms());
        for attempt in 1..=self.config.max_submit_attempts {
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(mint = %token.mint, "Cancelled, abandoning buy");
                    return TradeResult::failed("cancelled", now_ms());
                }
                outcome = self.collaborators.trader.buy(token, quote) => outcome,
            };
            last = match outcome {
                Ok(result) if result.success => return result,
                Ok(result) => result,
                Err(e) => TradeResult::failed(e.to_string(), now_ms()),
            };
            warn!(
                mint = %token.mint,
                attempt,
                max = self.config.max_submit_attempts,
                error = ?last.error,
                "Buy attempt failed"
            );
            if attempt < self.config.max_submit_attempts {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        info!(mint = %token.mint, "Cancelled, no further buy attempts");
                        return last;
                    }
                    _ = tokio::time::sleep(self.config.retry_delay) => {}
                }
            }
        }
        last
    }

    async fn sell_with_retry(
        &self,
        token: &TokenHandle,
        quote: &pump_trader_domain::prelude::SellQuote,
    ) -> TradeResult {
        let mut last = TradeResult::failed("no attempt made", now_ms());
        for attempt in 1..=self.config.max_submit_attempts {
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(mint = %token.mint, "Cancelled, abandoning sell");
                    return TradeResult::failed("cancelled", now_ms());
                }
                outcome = self.collaborators.trader.sell(token, quote) => outcome,
            };
            last = match outcome {
                Ok(result) if result.success => return result,
                Ok(result) => result,
                Err(e) => TradeResult::failed(e.to_string(), now_ms()),
            };
            warn!(
                mint = %token.mint,
                attempt,
                max = self.config.max_submit_attempts,
                error = ?last.error,
                "Sell attempt failed"
            );
            if attempt < self.config.max_submit_attempts {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        info!(mint = %token.mint, "Cancelled, no further sell attempts");
                        return last;
                    }
                    _ = tokio::time::sleep(self.config.retry_delay) => {}
                }
            }
        }
        last
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
