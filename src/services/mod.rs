pub mod karma;
pub mod vote;

pub use karma::{KarmaAdjustment, KarmaService};
pub use vote::VoteService;
