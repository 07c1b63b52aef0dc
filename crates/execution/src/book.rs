//! Position book: shared record of every position the bot has touched.

use pump_trader_domain::prelude::{Position, PositionId, PositionStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Aggregate view over the book.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BookSummary {
    pub total: usize,
    pub active: usize,
    pub closed: usize,
    pub failed: usize,
    /// Sum of unrealized PnL across active positions, lamports.
    pub unrealized_pnl: f64,
}

/// Concurrent map of positions keyed by id. Each trading task upserts
/// its own position; readers get clones, never references into the map.
#[derive(Default)]
pub struct PositionBook {
    positions: Arc<RwLock<HashMap<PositionId, Position>>>,
}

impl PositionBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a position snapshot.
    pub async fn upsert(&self, position: Position) {
        self.positions.write().await.insert(position.id, position);
    }

    pub async fn get(&self, id: PositionId) -> Option<Position> {
        self.positions.read().await.get(&id).cloned()
    }

    /// Positions that have not reached a terminal state.
    pub async fn active(&self) -> Vec<Position> {
        self.positions
            .read()
            .await
            .values()
            .filter(|p| !p.status.is_terminal())
            .cloned()
            .collect()
    }

    pub async fn summary(&self) -> BookSummary {
        let positions = self.positions.read().await;
        let mut summary = BookSummary {
            total: positions.len(),
            ..BookSummary::default()
        };
        for position in positions.values() {
            match position.status {
                PositionStatus::Closed => summary.closed += 1,
                PositionStatus::Failed => summary.failed += 1,
                _ => {
                    summary.active += 1;
                    summary.unrealized_pnl += position.unrealized_pnl;
                }
            }
        }
        summary
    }

    /// Logs a one-line book summary, for periodic status output.
    pub async fn log_summary(&self) {
        let summary = self.summary().await;
        info!(
            total = summary.total,
            active = summary.active,
            closed = summary.closed,
            failed = summary.failed,
            unrealized_pnl = summary.unrealized_pnl,
            "Position book"
        );
    }
}
