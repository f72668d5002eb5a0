/// Vote coordination.
///
/// A vote request is a tri-state toggle on the (voter, target) pair:
/// no standing vote creates one, a repeat of the standing direction
/// removes it, and the opposite direction flips it in place. The score
/// delta implied by the transition is pushed to the target's counter as
/// a single atomic store operation, after the vote record mutation has
/// committed, so a record-write failure aborts before any counter
/// mutation. The author's karma follows asynchronously and never blocks
/// the caller.
use crate::config::VoteLedgerConfig;
use crate::domain::models::{TargetKind, VoteDirection, VoteOutcome, VoteRecord};
use crate::error::{VoteError, VoteResult};
use crate::metrics::VoteMetrics;
use crate::repository::{TargetStore, VoteStore};
use crate::services::karma::{KarmaAdjustment, KarmaService};
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

/// What a vote request does to the standing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoteAction {
    /// No standing vote: create one with this direction.
    Insert(VoteDirection),
    /// Standing vote matches the request: remove it (toggle-off).
    Remove,
    /// Standing vote is opposite: overwrite with this direction.
    Flip(VoteDirection),
}

/// Outcome of the toggle state machine for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VoteTransition {
    action: VoteAction,
    delta: i64,
    user_vote: Option<VoteDirection>,
}

impl VoteTransition {
    /// Pure transition function over {None, Up, Down} x {Up, Down}.
    fn compute(prior: Option<VoteDirection>, requested: VoteDirection) -> Self {
        match prior {
            None => Self {
                action: VoteAction::Insert(requested),
                delta: requested.value(),
                user_vote: Some(requested),
            },
            Some(standing) if standing == requested => Self {
                action: VoteAction::Remove,
                delta: -standing.value(),
                user_vote: None,
            },
            Some(standing) => Self {
                action: VoteAction::Flip(requested),
                delta: requested.value() - standing.value(),
                user_vote: Some(requested),
            },
        }
    }
}

/// Orchestrates vote recording, score reconciliation and karma dispatch.
///
/// Safe to share across tasks; requests for distinct (voter, target)
/// pairs run concurrently, while racing requests from the same voter on
/// the same target serialize through a per-key lock so both observe the
/// record state their transition was computed from.
pub struct VoteService {
    votes: Arc<dyn VoteStore>,
    targets: Arc<dyn TargetStore>,
    karma: Arc<KarmaService>,
    locks: DashMap<(Uuid, Uuid), Arc<Mutex<()>>>,
    store_timeout: Duration,
    metrics: VoteMetrics,
}

impl VoteService {
    pub fn new(
        votes: Arc<dyn VoteStore>,
        targets: Arc<dyn TargetStore>,
        karma: Arc<KarmaService>,
        config: &VoteLedgerConfig,
        metrics: VoteMetrics,
    ) -> Self {
        Self {
            votes,
            targets,
            karma,
            locks: DashMap::new(),
            store_timeout: config.store_timeout(),
            metrics,
        }
    }

    /// Apply a vote request and return the target's fresh score along
    /// with the caller's resulting vote state.
    ///
    /// The operation is a strict toggle, not idempotent: repeating the
    /// same request un-votes, repeating again re-votes. A timed-out
    /// request is safe to retry but may already have been applied.
    #[instrument(skip(self))]
    pub async fn vote(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
        requested: VoteDirection,
    ) -> VoteResult<VoteOutcome> {
        if voter_id.is_nil() {
            return Err(VoteError::InvalidArgument("nil voter id".into()));
        }
        if target_id.is_nil() {
            return Err(VoteError::InvalidArgument("nil target id".into()));
        }

        let timer = self.metrics.vote_latency_seconds.start_timer();
        let guard = self.lock_pair(voter_id, target_id).await;
        let result = self
            .vote_locked(voter_id, target_id, target_kind, requested)
            .await;
        self.unlock_pair(voter_id, target_id, guard);
        timer.observe_duration();
        result
    }

    /// Store-facing portion of [`Self::vote`]; runs with the (voter,
    /// target) pair lock held.
    async fn vote_locked(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
        requested: VoteDirection,
    ) -> VoteResult<VoteOutcome> {
        let target = self
            .bounded(self.targets.find(target_id, target_kind))
            .await?
            .ok_or_else(|| VoteError::NotFound(format!("{} {}", target_kind, target_id)))?;

        let prior = self
            .bounded(self.votes.get(voter_id, target_id, target_kind))
            .await?;
        let transition =
            VoteTransition::compute(prior.as_ref().map(|record| record.direction), requested);

        // Vote record first; if this write fails the counter is untouched.
        match transition.action {
            VoteAction::Insert(direction) => {
                let record = VoteRecord::new(voter_id, target_id, target_kind, direction);
                self.bounded(self.votes.put(&record)).await?;
                self.metrics.votes_recorded.inc();
            }
            VoteAction::Remove => {
                self.bounded(self.votes.delete(voter_id, target_id, target_kind))
                    .await?;
                self.metrics.votes_removed.inc();
            }
            VoteAction::Flip(direction) => {
                let mut record = prior.expect("flip transition implies a standing record");
                record.direction = direction;
                self.bounded(self.votes.put(&record)).await?;
                self.metrics.votes_flipped.inc();
            }
        }

        let score = self
            .bounded(self.targets.apply_delta(target_id, target_kind, transition.delta))
            .await?;

        if target.author_id != voter_id && transition.delta != 0 {
            self.karma.submit(KarmaAdjustment {
                author_id: target.author_id,
                delta: transition.delta,
            });
        }

        debug!(
            voter_id = %voter_id,
            target_id = %target_id,
            delta = transition.delta,
            score,
            "Vote applied"
        );

        Ok(VoteOutcome {
            score,
            user_vote: transition.user_vote,
        })
    }

    /// Record the author's automatic Up vote for freshly created
    /// content. The content service seeds the target's score at 1; this
    /// inserts the matching record, and does nothing if one already
    /// exists. Returns true if a record was inserted.
    pub async fn seed_author_vote(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> VoteResult<bool> {
        if author_id.is_nil() {
            return Err(VoteError::InvalidArgument("nil author id".into()));
        }
        if target_id.is_nil() {
            return Err(VoteError::InvalidArgument("nil target id".into()));
        }

        let record = VoteRecord::new(author_id, target_id, target_kind, VoteDirection::Up);
        let inserted = self.bounded(self.votes.insert_new(&record)).await?;
        if inserted {
            self.metrics.votes_recorded.inc();
        }
        Ok(inserted)
    }

    /// Batch "your vote" annotation for feeds and threads: one query
    /// for any number of targets. The returned map has entries only for
    /// targets the voter actually voted on.
    pub async fn votes_for_voter(
        &self,
        voter_id: Uuid,
        target_ids: &[Uuid],
    ) -> VoteResult<HashMap<Uuid, VoteDirection>> {
        if voter_id.is_nil() {
            return Err(VoteError::InvalidArgument("nil voter id".into()));
        }
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = self
            .bounded(self.votes.list_for_voter(voter_id, target_ids))
            .await?;

        Ok(records
            .into_iter()
            .map(|record| (record.target_id, record.direction))
            .collect())
    }

    /// Bound a store round trip by the configured timeout.
    async fn bounded<T, F>(&self, fut: F) -> VoteResult<T>
    where
        F: Future<Output = VoteResult<T>>,
    {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| VoteError::Timeout(self.store_timeout))?
    }

    /// Serialize racing requests from the same voter on the same target.
    async fn lock_pair(&self, voter_id: Uuid, target_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry((voter_id, target_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    fn unlock_pair(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        guard: tokio::sync::OwnedMutexGuard<()>,
    ) {
        drop(guard);
        // Drop the map entry once no request holds or awaits it.
        self.locks
            .remove_if(&(voter_id, target_id), |_, lock| Arc::strong_count(lock) <= 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vote_inserts_with_unit_delta() {
        for requested in [VoteDirection::Up, VoteDirection::Down] {
            let t = VoteTransition::compute(None, requested);
            assert_eq!(t.action, VoteAction::Insert(requested));
            assert_eq!(t.delta, requested.value());
            assert_eq!(t.user_vote, Some(requested));
        }
    }

    #[test]
    fn repeat_vote_toggles_off() {
        for standing in [VoteDirection::Up, VoteDirection::Down] {
            let t = VoteTransition::compute(Some(standing), standing);
            assert_eq!(t.action, VoteAction::Remove);
            assert_eq!(t.delta, -standing.value());
            assert_eq!(t.user_vote, None);
        }
    }

    #[test]
    fn opposite_vote_flips_with_double_delta() {
        let up_to_down = VoteTransition::compute(Some(VoteDirection::Up), VoteDirection::Down);
        assert_eq!(up_to_down.action, VoteAction::Flip(VoteDirection::Down));
        assert_eq!(up_to_down.delta, -2);
        assert_eq!(up_to_down.user_vote, Some(VoteDirection::Down));

        let down_to_up = VoteTransition::compute(Some(VoteDirection::Down), VoteDirection::Up);
        assert_eq!(down_to_up.action, VoteAction::Flip(VoteDirection::Up));
        assert_eq!(down_to_up.delta, 2);
        assert_eq!(down_to_up.user_vote, Some(VoteDirection::Up));
    }

    #[test]
    fn transitions_compose_back_to_start() {
        // Up, Up, Down, Down walks None -> Up -> None -> Down -> None
        // and the deltas sum to zero.
        let mut state = None;
        let mut total = 0i64;
        for requested in [
            VoteDirection::Up,
            VoteDirection::Up,
            VoteDirection::Down,
            VoteDirection::Down,
        ] {
            let t = VoteTransition::compute(state, requested);
            state = t.user_vote;
            total += t.delta;
        }
        assert_eq!(state, None);
        assert_eq!(total, 0);
    }
}
