//! Trading pipeline: feed consumption, monitoring and orchestration.
//!
//! This crate drives positions through their lifecycle against the
//! collaborator traits defined by the protocols crate. It owns the
//! timing concerns (poll loops, retry delays, budgets, cancellation)
//! that the pure domain crate deliberately avoids.

/// Prelude module for convenient imports.
pub mod prelude;

/// Position book shared across trading tasks.
pub mod book;
/// Execution-layer errors.
pub mod errors;
/// Token discovery feed plumbing.
pub mod feed;
/// Position monitoring loop.
pub mod monitor;
/// Trade orchestration pipeline.
pub mod orchestrator;
