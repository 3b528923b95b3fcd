//! Polls: questions with a publication date and a voting deadline, one vote
//! per user per question, and results counted from the recorded votes.

pub mod listing;
pub mod manage;
pub mod results;
pub mod vote;
pub mod window;

pub use listing::{find_published, published_questions};
pub use results::{tally, ChoiceTally, QuestionResults};
pub use vote::{record_vote, VoteError, Voted, Voter};
pub use window::{can_vote, is_published, was_published_recently};
