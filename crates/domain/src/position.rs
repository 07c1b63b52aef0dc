//! Position state machine and exit policies.
//!
//! A [`Position`] tracks one trade through its lifecycle:
//!
//! ```text
//! Open -> Monitoring -> Selling -> Closed
//!   \         \            \
//!    +---------+------------+--> Failed
//! ```
//!
//! Transitions only move forward; `Closed` and `Failed` are terminal.
//! The machine is clock-free: callers pass `now_ms` (unix milliseconds)
//! into every time-sensitive operation, which keeps exit decisions
//! deterministic and testable.

use crate::errors::PositionError;
use crate::token::TokenHandle;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(pub Uuid);

impl PositionId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PositionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a position. Strictly forward-progressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Monitoring,
    Selling,
    Closed,
    Failed,
}

impl PositionStatus {
    /// True for `Closed` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Exit policy attached to a position at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExitStrategy {
    /// Exit unconditionally after holding for `max_hold_ms`.
    TimeBased { max_hold_ms: u64 },
    /// Exit on a profit threshold or a loss threshold, whichever is hit
    /// first. Both are fractions of entry price (0.5 = 50%).
    TakeProfitStopLoss { take_profit_pct: f64, stop_loss_pct: f64 },
    /// Never auto-exits; an operator closes the position.
    Manual,
}

/// Why a position exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Timeout,
    Manual,
}

/// Why a position is staying open this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldReason {
    /// The position is not in the `Monitoring` state.
    NotMonitoring,
    /// Entry or current price is missing, so thresholds cannot be checked.
    NoPriceData,
    /// Prices are known but no threshold has been crossed.
    NoSignal,
    /// The strategy is `Manual` and never signals on its own.
    ManualOnly,
}

/// Outcome of an exit-condition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCheck {
    Exit(ExitReason),
    Hold(HoldReason),
}

impl ExitCheck {
    /// True when the position should be unwound.
    #[must_use]
    pub fn should_exit(&self) -> bool {
        matches!(self, Self::Exit(_))
    }
}

/// Result of one buy or sell execution attempt, as reported by the chain
/// client. Consumed only by position transition logic; retry operates on
/// whole attempts, never on this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub success: bool,
    /// Transaction signature, when one was produced.
    pub signature: Option<String>,
    /// Error message for failed attempts.
    pub error: Option<String>,
    /// Amount filled: tokens received on a buy, lamports received on a sell.
    pub amount: Option<f64>,
    /// Effective price of the fill, lamports per token base unit.
    pub price: Option<f64>,
    /// Unix milliseconds when the result was produced.
    pub timestamp: i64,
}

impl TradeResult {
    /// A confirmed fill.
    #[must_use]
    pub fn filled(signature: String, amount: f64, price: f64, timestamp: i64) -> Self {
        Self {
            success: true,
            signature: Some(signature),
            error: None,
            amount: Some(amount),
            price: Some(price),
            timestamp,
        }
    }

    /// A terminal failure.
    #[must_use]
    pub fn failed(error: impl Into<String>, timestamp: i64) -> Self {
        Self {
            success: false,
            signature: None,
            error: Some(error.into()),
            amount: None,
            price: None,
            timestamp,
        }
    }
}

/// One open trade: entry data, live price, unrealized PnL and the exit
/// policy that decides when to unwind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub token: TokenHandle,
    /// Base amount committed to the buy, lamports.
    pub buy_amount_base: u64,
    pub status: PositionStatus,
    pub exit_strategy: ExitStrategy,

    /// Token balance credited by the buy, token base units.
    pub token_balance: f64,
    /// Entry price, set once on `Open -> Monitoring`.
    pub entry_price: Option<f64>,
    /// Latest observed price, refreshed every monitor tick.
    pub current_price: Option<f64>,
    /// `token_balance * current_price - buy_amount_base`, lamports.
    pub unrealized_pnl: f64,

    pub buy_result: Option<TradeResult>,
    pub sell_result: Option<TradeResult>,

    /// Unix milliseconds of creation.
    pub created_at: i64,
    /// Unix milliseconds of the last mutation.
    pub updated_at: i64,
}

impl Position {
    /// Creates a position in `Open`, ready for its buy to be submitted.
    #[must_use]
    pub fn new(
        token: TokenHandle,
        buy_amount_base: u64,
        exit_strategy: ExitStrategy,
        now_ms: i64,
    ) -> Self {
        Self {
            id: PositionId::new(),
            token,
            buy_amount_base,
            status: PositionStatus::Open,
            exit_strategy,
            token_balance: 0.0,
            entry_price: None,
            current_price: None,
            unrealized_pnl: 0.0,
            buy_result: None,
            sell_result: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Applies the outcome of the buy attempt.
    ///
    /// On success: `Open -> Monitoring`, entry price and token balance are
    /// recorded. On failure: `Open -> Failed`. Calling this in any other
    /// state is a caller bug and returns `InvalidTransition` without
    /// touching the position.
    pub fn apply_buy_result(&mut self, result: TradeResult, now_ms: i64) -> Result<(), PositionError> {
        if self.status != PositionStatus::Open {
            return Err(self.invalid("apply_buy_result"));
        }

        if result.success {
            self.status = PositionStatus::Monitoring;
            self.entry_price = result.price;
            self.token_balance = result.amount.unwrap_or(0.0);
        } else {
            self.status = PositionStatus::Failed;
        }
        self.buy_result = Some(result);
        self.updated_at = now_ms;
        Ok(())
    }

    /// Records a new observed price and recomputes unrealized PnL.
    /// Valid only while `Monitoring`.
    pub fn update_price(&mut self, price: f64, now_ms: i64) -> Result<(), PositionError> {
        if self.status != PositionStatus::Monitoring {
            return Err(PositionError::NotMonitoring);
        }
        self.current_price = Some(price);
        self.unrealized_pnl = self.token_balance * price - self.buy_amount_base as f64;
        self.updated_at = now_ms;
        Ok(())
    }

    /// Marks the position as having its sell in flight: `Monitoring -> Selling`.
    pub fn mark_selling(&mut self, now_ms: i64) -> Result<(), PositionError> {
        if self.status != PositionStatus::Monitoring {
            return Err(self.invalid("mark_selling"));
        }
        self.status = PositionStatus::Selling;
        self.updated_at = now_ms;
        Ok(())
    }

    /// Applies the outcome of the sell attempt: `Monitoring/Selling -> Closed`
    /// on success, `-> Failed` otherwise.
    pub fn apply_sell_result(&mut self, result: TradeResult, now_ms: i64) -> Result<(), PositionError> {
        if !matches!(self.status, PositionStatus::Monitoring | PositionStatus::Selling) {
            return Err(self.invalid("apply_sell_result"));
        }

        self.status = if result.success {
            PositionStatus::Closed
        } else {
            PositionStatus::Failed
        };
        self.sell_result = Some(result);
        self.updated_at = now_ms;
        Ok(())
    }

    /// Forces the position into `Failed` from any non-terminal state, for
    /// failures outside the buy/sell result path (e.g. a quote error).
    pub fn fail(&mut self, now_ms: i64) -> Result<(), PositionError> {
        if self.status.is_terminal() {
            return Err(self.invalid("fail"));
        }
        self.status = PositionStatus::Failed;
        self.updated_at = now_ms;
        Ok(())
    }

    /// Evaluates the exit policy at `now_ms`.
    ///
    /// For take-profit/stop-loss the profit test runs first, making the
    /// (degenerate) case where both thresholds are crossed deterministic.
    #[must_use]
    pub fn should_exit(&self, now_ms: i64) -> ExitCheck {
        if self.status != PositionStatus::Monitoring {
            return ExitCheck::Hold(HoldReason::NotMonitoring);
        }

        match self.exit_strategy {
            ExitStrategy::TimeBased { max_hold_ms } => {
                if now_ms.saturating_sub(self.created_at) >= max_hold_ms as i64 {
                    ExitCheck::Exit(ExitReason::Timeout)
                } else {
                    ExitCheck::Hold(HoldReason::NoSignal)
                }
            }
            ExitStrategy::TakeProfitStopLoss { take_profit_pct, stop_loss_pct } => {
                let (Some(entry), Some(current)) = (self.entry_price, self.current_price) else {
                    return ExitCheck::Hold(HoldReason::NoPriceData);
                };
                let profit_pct = (current - entry) / entry;
                if profit_pct >= take_profit_pct {
                    ExitCheck::Exit(ExitReason::TakeProfit)
                } else if profit_pct <= -stop_loss_pct {
                    ExitCheck::Exit(ExitReason::StopLoss)
                } else {
                    ExitCheck::Hold(HoldReason::NoSignal)
                }
            }
            ExitStrategy::Manual => ExitCheck::Hold(HoldReason::ManualOnly),
        }
    }

    /// Profit as a fraction of entry price, when both prices are known.
    #[must_use]
    pub fn profit_pct(&self) -> Option<f64> {
        let entry = self.entry_price?;
        let current = self.current_price?;
        Some((current - entry) / entry)
    }

    /// Milliseconds since creation.
    #[must_use]
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.created_at)
    }

    fn invalid(&self, op: &'static str) -> PositionError {
        PositionError::InvalidTransition {
            op,
            status: format!("{:?}", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> TokenHandle {
        TokenHandle {
            mint: "mint1111111111111111111111111111111111111111".into(),
            name: "Test Token".into(),
            symbol: "TEST".into(),
            creator: "creator111111111111111111111111111111111111".into(),
            bonding_curve: "curve11111111111111111111111111111111111111".into(),
            associated_bonding_curve: "ata111111111111111111111111111111111111111".into(),
        }
    }

    fn tpsl_position(now: i64) -> Position {
        Position::new(
            token(),
            100_000_000,
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            now,
        )
    }

    fn fill(price: f64, now: i64) -> TradeResult {
        TradeResult::filled("Sig111".into(), 1_000_000.0, price, now)
    }

    #[test]
    fn test_full_lifecycle() {
        let mut pos = tpsl_position(0);
        assert_eq!(pos.status, PositionStatus::Open);

        pos.apply_buy_result(fill(1.0, 10), 10).unwrap();
        assert_eq!(pos.status, PositionStatus::Monitoring);
        assert_eq!(pos.entry_price, Some(1.0));
        assert_eq!(pos.token_balance, 1_000_000.0);

        pos.update_price(1.2, 20).unwrap();
        assert_eq!(pos.current_price, Some(1.2));

        pos.mark_selling(30).unwrap();
        assert_eq!(pos.status, PositionStatus::Selling);

        pos.apply_sell_result(fill(1.2, 40), 40).unwrap();
        assert_eq!(pos.status, PositionStatus::Closed);

        // Terminal: a second buy result must not silently re-open.
        let err = pos.apply_buy_result(fill(1.0, 50), 50);
        assert!(err.is_err());
        assert_eq!(pos.status, PositionStatus::Closed);
    }

    #[test]
    fn test_failed_buy_terminates_position() {
        let mut pos = tpsl_position(0);
        pos.apply_buy_result(TradeResult::failed("submit failed", 10), 10)
            .unwrap();
        assert_eq!(pos.status, PositionStatus::Failed);
        assert!(pos.entry_price.is_none());
    }

    #[test]
    fn test_failed_sell_terminates_position() {
        let mut pos = tpsl_position(0);
        pos.apply_buy_result(fill(1.0, 10), 10).unwrap();
        pos.apply_sell_result(TradeResult::failed("submit failed", 20), 20)
            .unwrap();
        assert_eq!(pos.status, PositionStatus::Failed);
    }

    #[test]
    fn test_update_price_outside_monitoring_is_rejected() {
        let mut pos = tpsl_position(0);
        assert_eq!(pos.update_price(1.0, 10), Err(PositionError::NotMonitoring));
    }

    #[test]
    fn test_pnl_tracks_price() {
        let mut pos = tpsl_position(0);
        pos.apply_buy_result(fill(100.0, 10), 10).unwrap();

        // 1M tokens at 150 lamports each vs 100M lamports spent.
        pos.update_price(150.0, 20).unwrap();
        assert_eq!(pos.unrealized_pnl, 1_000_000.0 * 150.0 - 100_000_000.0);
    }

    #[test]
    fn test_tp_sl_determinism() {
        let mut pos = tpsl_position(0);
        pos.apply_buy_result(fill(1.0, 10), 10).unwrap();

        pos.update_price(1.5, 20).unwrap();
        assert_eq!(pos.should_exit(20), ExitCheck::Exit(ExitReason::TakeProfit));

        pos.update_price(0.79, 30).unwrap();
        assert_eq!(pos.should_exit(30), ExitCheck::Exit(ExitReason::StopLoss));

        pos.update_price(1.1, 40).unwrap();
        assert_eq!(pos.should_exit(40), ExitCheck::Hold(HoldReason::NoSignal));
    }

    #[test]
    fn test_tp_sl_without_price_data_holds() {
        let mut pos = tpsl_position(0);
        pos.apply_buy_result(
            TradeResult {
                price: None,
                ..fill(1.0, 10)
            },
            10,
        )
        .unwrap();
        assert_eq!(pos.should_exit(20), ExitCheck::Hold(HoldReason::NoPriceData));
    }

    #[test]
    fn test_time_based_exit_boundary() {
        let t0 = 1_000_000;
        let mut pos = Position::new(
            token(),
            100_000_000,
            ExitStrategy::TimeBased { max_hold_ms: 60_000 },
            t0,
        );
        pos.apply_buy_result(fill(1.0, t0), t0).unwrap();

        assert_eq!(pos.should_exit(t0 + 59_000), ExitCheck::Hold(HoldReason::NoSignal));
        assert_eq!(pos.should_exit(t0 + 60_000), ExitCheck::Exit(ExitReason::Timeout));
    }

    #[test]
    fn test_manual_strategy_never_signals() {
        let mut pos = Position::new(token(), 1, ExitStrategy::Manual, 0);
        pos.apply_buy_result(fill(1.0, 10), 10).unwrap();
        pos.update_price(1000.0, 20).unwrap();
        assert_eq!(pos.should_exit(20), ExitCheck::Hold(HoldReason::ManualOnly));
    }

    #[test]
    fn test_should_exit_outside_monitoring() {
        let pos = tpsl_position(0);
        assert_eq!(pos.should_exit(10), ExitCheck::Hold(HoldReason::NotMonitoring));
    }
}
