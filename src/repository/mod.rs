pub mod karma;
pub mod targets;
pub mod votes;

pub use karma::{KarmaStore, PgKarmaStore};
pub use targets::{PgTargetStore, TargetStore};
pub use votes::{PgVoteStore, VoteStore};
