//! Position monitoring loop.
//!
//! One monitor runs per open position. Each tick it refreshes the curve
//! snapshot, records the spot price on the position and evaluates the
//! exit policy. The loop ends on an exit signal, on budget exhaustion or
//! on cancellation; failed ticks are skipped, never fatal.

use crate::errors::ExecutionError;
use anyhow::Result;
use chrono::Utc;
use pump_trader_domain::prelude::{CurveEngine, ExitCheck, ExitReason, Position};
use pump_trader_protocols::CurveSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timing budget of a monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Delay between price polls.
    pub poll_interval: Duration,
    /// Total time the monitor may spend before forcing a timeout exit.
    pub time_limit: Duration,
}

impl MonitoringConfig {
    /// Rejects budgets that cannot produce a single meaningful tick.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.poll_interval.is_zero() {
            return Err(ExecutionError::InvalidConfig(
                "poll_interval must be greater than zero".into(),
            ));
        }
        if self.time_limit < self.poll_interval {
            return Err(ExecutionError::InvalidConfig(format!(
                "time_limit {:?} is shorter than poll_interval {:?}",
                self.time_limit, self.poll_interval
            )));
        }
        Ok(())
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            time_limit: Duration::from_secs(300),
        }
    }
}

/// How a monitoring run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorOutcome {
    pub reason: ExitReason,
    /// Wall time the monitor spent.
    pub elapsed: Duration,
    /// Last observed price, if any tick succeeded.
    pub last_price: Option<f64>,
}

/// Polls one position until its exit policy fires.
pub struct PositionMonitor {
    config: MonitoringConfig,
    source: Arc<dyn CurveSource>,
    engine: CurveEngine,
    cancel: CancellationToken,
}

impl PositionMonitor {
    pub fn new(
        config: MonitoringConfig,
        source: Arc<dyn CurveSource>,
        engine: CurveEngine,
        cancel: CancellationToken,
    ) -> Result<Self, ExecutionError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            engine,
            cancel,
        })
    }

    /// Runs the monitoring loop to completion.
    ///
    /// The position must be in `Monitoring`. Returns the exit reason;
    /// cancellation reports `Manual`, an exhausted time budget reports
    /// `Timeout` regardless of strategy.
    pub async fn run(&self, position: &mut Position) -> Result<MonitorOutcome> {
        let started = Instant::now();
        let started_wall = Utc::now().timestamp_millis();
        let deadline = started + self.config.time_limit;

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            position = %position.id.0,
            mint = %position.token.mint,
            poll_interval = ?self.config.poll_interval,
            time_limit = ?self.config.time_limit,
            "Monitoring position"
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(position = %position.id.0, "Monitoring cancelled");
                    return Ok(self.outcome(ExitReason::Manual, started, position));
                }
                _ = ticker.tick() => {}
            }

            if Instant::now() >= deadline {
                info!(position = %position.id.0, "Monitoring budget exhausted");
                return Ok(self.outcome(ExitReason::Timeout, started, position));
            }

            let now_ms = started_wall + started.elapsed().as_millis() as i64;

            let fetched = self.source.fetch_curve(&position.token.bonding_curve).await;

            // A fetch that straddles cancellation finishes, but its result
            // must not influence the position anymore.
            if self.cancel.is_cancelled() {
                info!(position = %position.id.0, "Monitoring cancelled");
                return Ok(self.outcome(ExitReason::Manual, started, position));
            }

            match fetched {
                Ok(model) => {
                    let price = self.engine.spot_price(&model);
                    position.update_price(price, now_ms)?;
                    debug!(
                        position = %position.id.0,
                        price,
                        pnl = position.unrealized_pnl,
                        "Price tick"
                    );
                }
                Err(e) => {
                    warn!(position = %position.id.0, error = %e, "Price poll failed, skipping tick");
                }
            }

            if let ExitCheck::Exit(reason) = position.should_exit(now_ms) {
                info!(position = %position.id.0, ?reason, "Exit signal");
                return Ok(self.outcome(reason, started, position));
            }
        }
    }

    fn outcome(&self, reason: ExitReason, started: Instant, position: &Position) -> MonitorOutcome {
        MonitorOutcome {
            reason,
            elapsed: started.elapsed(),
            last_price: position.current_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pump_trader_domain::prelude::{
        CurveModel, CurveParams, ExitStrategy, TokenHandle, TradeResult,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of reserve snapshots, repeating the last.
    struct ScriptedSource {
        snapshots: Mutex<Vec<CurveModel>>,
        polls: AtomicUsize,
        fail_first: usize,
    }

    impl ScriptedSource {
        fn new(snapshots: Vec<CurveModel>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots),
                polls: AtomicUsize::new(0),
                fail_first: 0,
            }
        }
    }

    #[async_trait]
    impl CurveSource for ScriptedSource {
        async fn fetch_curve(&self, _bonding_curve: &str) -> anyhow::Result<CurveModel> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            if poll < self.fail_first {
                anyhow::bail!("rpc unavailable");
            }
            let mut snapshots = self.snapshots.lock().unwrap();
            if snapshots.len() > 1 {
                Ok(snapshots.remove(0))
            } else {
                Ok(snapshots[0])
            }
        }
    }

    fn token() -> TokenHandle {
        TokenHandle {
            mint: "mint1111111111111111111111111111111111111111".into(),
            name: "Test".into(),
            symbol: "TST".into(),
            creator: "creator111111111111111111111111111111111111".into(),
            bonding_curve: "curve11111111111111111111111111111111111111".into(),
            associated_bonding_curve: "ata111111111111111111111111111111111111111".into(),
        }
    }

    /// A model whose spot price is `virtual_base / virtual_tokens`.
    fn model(virtual_base: u128, virtual_tokens: u128) -> CurveModel {
        CurveModel {
            virtual_base_reserves: virtual_base,
            virtual_token_reserves: virtual_tokens,
            real_base_reserves: 0,
            real_token_reserves: virtual_tokens,
            is_complete: false,
        }
    }

    fn monitored_position(strategy: ExitStrategy, entry_price: f64) -> Position {
        let now = Utc::now().timestamp_millis();
        let mut position = Position::new(token(), 1_000_000_000, strategy, now);
        position
            .apply_buy_result(
                TradeResult::filled("Sig".into(), 1_000_000.0, entry_price, now),
                now,
            )
            .unwrap();
        position
    }

    fn config(poll_secs: u64, limit_secs: u64) -> MonitoringConfig {
        MonitoringConfig {
            poll_interval: Duration::from_secs(poll_secs),
            time_limit: Duration::from_secs(limit_secs),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(config(1, 60).validate().is_ok());
        assert!(config(0, 60).validate().is_err());
        assert!(config(10, 5).validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_profit_exit() {
        // Entry at 1000 lamports per base unit; second snapshot doubles it.
        let source = Arc::new(ScriptedSource::new(vec![
            model(1_000_000_000, 1_000_000),
            model(2_000_000_000, 1_000_000),
        ]));
        let monitor = PositionMonitor::new(
            config(1, 600),
            source,
            CurveEngine::new(CurveParams::default()),
            CancellationToken::new(),
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            1_000.0,
        );

        let outcome = monitor.run(&mut position).await.unwrap();
        assert_eq!(outcome.reason, ExitReason::TakeProfit);
        assert_eq!(outcome.last_price, Some(2_000.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_loss_exit() {
        let source = Arc::new(ScriptedSource::new(vec![
            model(1_000_000_000, 1_000_000),
            model(700_000_000, 1_000_000),
        ]));
        let monitor = PositionMonitor::new(
            config(1, 600),
            source,
            CurveEngine::new(CurveParams::default()),
            CancellationToken::new(),
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            1_000.0,
        );

        let outcome = monitor.run(&mut position).await.unwrap();
        assert_eq!(outcome.reason, ExitReason::StopLoss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_with_flat_price() {
        // 10s budget, 2s polls, price never moves: timeout after ~10s.
        let source = Arc::new(ScriptedSource::new(vec![model(1_000_000_000, 1_000_000)]));
        let source_ref = Arc::clone(&source);
        let monitor = PositionMonitor::new(
            config(2, 10),
            source_ref,
            CurveEngine::new(CurveParams::default()),
            CancellationToken::new(),
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            1_000.0,
        );

        let outcome = monitor.run(&mut position).await.unwrap();
        assert_eq!(outcome.reason, ExitReason::Timeout);
        assert!(outcome.elapsed >= Duration::from_secs(10));
        // Ticks at 0, 2, 4, 6 and 8 seconds all polled.
        assert_eq!(source.polls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_based_strategy_exit() {
        let source = Arc::new(ScriptedSource::new(vec![model(1_000_000_000, 1_000_000)]));
        let monitor = PositionMonitor::new(
            config(1, 600),
            source,
            CurveEngine::new(CurveParams::default()),
            CancellationToken::new(),
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TimeBased { max_hold_ms: 5_000 },
            1_000.0,
        );

        let outcome = monitor.run(&mut position).await.unwrap();
        assert_eq!(outcome.reason, ExitReason::Timeout);
        assert!(outcome.elapsed >= Duration::from_secs(5));
        assert!(outcome.elapsed < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_polls_are_skipped() {
        let source = Arc::new(ScriptedSource {
            snapshots: Mutex::new(vec![model(2_000_000_000, 1_000_000)]),
            polls: AtomicUsize::new(0),
            fail_first: 3,
        });
        let source_ref = Arc::clone(&source);
        let monitor = PositionMonitor::new(
            config(1, 600),
            source_ref,
            CurveEngine::new(CurveParams::default()),
            CancellationToken::new(),
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            1_000.0,
        );

        // Three failed polls, then a doubled price on the fourth.
        let outcome = monitor.run(&mut position).await.unwrap();
        assert_eq!(outcome.reason, ExitReason::TakeProfit);
        assert_eq!(source.polls.load(Ordering::SeqCst), 4);
    }

    /// Cancels the shared token from inside the fetch itself, modeling a
    /// shutdown that lands while a poll is in flight.
    struct CancelDuringFetch {
        cancel: CancellationToken,
    }

    #[async_trait]
    impl CurveSource for CancelDuringFetch {
        async fn fetch_curve(&self, _bonding_curve: &str) -> anyhow::Result<CurveModel> {
            self.cancel.cancel();
            Ok(model(2_000_000_000, 1_000_000))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_straddling_cancellation_is_discarded() {
        let cancel = CancellationToken::new();
        let source = Arc::new(CancelDuringFetch { cancel: cancel.clone() });
        let monitor = PositionMonitor::new(
            config(1, 600),
            source,
            CurveEngine::new(CurveParams::default()),
            cancel,
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            1_000.0,
        );

        // The fetched price doubled and would trip take-profit if applied.
        let outcome = monitor.run(&mut position).await.unwrap();
        assert_eq!(outcome.reason, ExitReason::Manual);
        assert_eq!(outcome.last_price, None);
        assert_eq!(position.current_price, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_monitoring() {
        let source = Arc::new(ScriptedSource::new(vec![model(1_000_000_000, 1_000_000)]));
        let cancel = CancellationToken::new();
        let monitor = PositionMonitor::new(
            config(1, 600),
            source,
            CurveEngine::new(CurveParams::default()),
            cancel.clone(),
        )
        .unwrap();

        let mut position = monitored_position(
            ExitStrategy::TakeProfitStopLoss { take_profit_pct: 0.5, stop_loss_pct: 0.2 },
            1_000.0,
        );

        let handle = tokio::spawn(async move {
            monitor.run(&mut position).await.unwrap()
        });
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        cancel.cancel();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome.reason, ExitReason::Manual);
        assert!(outcome.elapsed < Duration::from_secs(600));
    }
}
