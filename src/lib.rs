//! # Vote Ledger & Score Reconciliation Engine
//!
//! Records one vote per (voter, target) pair, keeps a denormalized
//! score on the voted content in step with the ledger, and propagates
//! a derived karma delta to the content's author in the background.
//!
//! ## How a vote flows
//!
//! 1. The coordinator serializes racing requests from the same voter on
//!    the same target, then loads the standing vote record.
//! 2. The (standing, requested) pair drives a tri-state toggle: create,
//!    remove (toggle-off), or flip the record.
//! 3. The implied score delta (±1 for create/remove, ±2 for a flip) is
//!    applied to the target's counter as one atomic store operation,
//!    never read-modify-write, and only after the record mutation
//!    committed.
//! 4. If the voter is not the author, a matching karma adjustment is
//!    queued for background application. The queue is bounded and
//!    best-effort: karma may lag the score and is dropped, not retried,
//!    on failure.
//!
//! Concurrent voters on the same target need no coordination beyond the
//! store's atomic increment; their deltas commute.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vote_ledger::{
//!     KarmaService, PgKarmaStore, PgTargetStore, PgVoteStore, TargetKind,
//!     VoteDirection, VoteLedgerConfig, VoteMetrics, VoteService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgresql://localhost/nested").await?;
//!     vote_ledger::MIGRATOR.run(&pool).await?;
//!
//!     let config = VoteLedgerConfig::from_env();
//!     let metrics = VoteMetrics::new("vote-ledger");
//!     let karma = Arc::new(KarmaService::spawn(
//!         Arc::new(PgKarmaStore::new(pool.clone())),
//!         config.karma_queue_capacity,
//!         config.karma_workers,
//!         metrics.clone(),
//!     ));
//!     let votes = VoteService::new(
//!         Arc::new(PgVoteStore::new(pool.clone())),
//!         Arc::new(PgTargetStore::new(pool)),
//!         karma,
//!         &config,
//!         metrics,
//!     );
//!
//!     # let (voter_id, post_id) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
//!     let outcome = votes
//!         .vote(voter_id, post_id, TargetKind::Post, VoteDirection::Up)
//!         .await?;
//!     println!("score {}, your vote {}", outcome.score, outcome.user_vote_value());
//!     Ok(())
//! }
//! ```

use sqlx::migrate::Migrator;

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod services;

pub use config::VoteLedgerConfig;
pub use domain::models::{TargetKind, TargetSummary, VoteDirection, VoteOutcome, VoteRecord};
pub use error::{VoteError, VoteResult};
pub use metrics::VoteMetrics;
pub use repository::{
    KarmaStore, PgKarmaStore, PgTargetStore, PgVoteStore, TargetStore, VoteStore,
};
pub use services::{KarmaAdjustment, KarmaService, VoteService};

/// Embedded schema migrations for the votes table and the reference
/// DDL of collaborator-owned counters.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
