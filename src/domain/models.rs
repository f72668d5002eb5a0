use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Vote polarity: Up counts +1, Down counts -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Signed contribution of this direction to a target's score.
    pub fn value(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i16> for VoteDirection {
    type Error = i16;

    fn try_from(raw: i16) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(other),
        }
    }
}

/// Kind of content a vote points at.
///
/// Selects which table holds the target's denormalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            other => Err(format!("unknown target kind: {}", other)),
        }
    }
}

/// A single voter's vote on a single target.
///
/// At most one record exists per (voter_id, target_id, target_kind);
/// the votes table enforces this with a unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: Uuid,
    pub voter_id: Uuid,
    pub target_id: Uuid,
    pub target_kind: TargetKind,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
}

impl VoteRecord {
    pub fn new(
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
        direction: VoteDirection,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            voter_id,
            target_id,
            target_kind,
            direction,
            created_at: Utc::now(),
        }
    }
}

/// Projection of a vote target read from the content store.
#[derive(Debug, Clone, Copy)]
pub struct TargetSummary {
    pub author_id: Uuid,
    pub score: i64,
}

/// Result of a vote operation: the target's fresh score and the
/// caller's vote state after the toggle (`None` = no standing vote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub score: i64,
    pub user_vote: Option<VoteDirection>,
}

impl VoteOutcome {
    /// Wire value for the caller's vote state: -1, 0 or 1.
    pub fn user_vote_value(&self) -> i64 {
        self.user_vote.map(VoteDirection::value).unwrap_or(0)
    }
}
