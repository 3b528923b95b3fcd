//! Time-window checks for a question.
//!
//! All checks take `now` explicitly so callers (and tests) control the clock.

use crate::orm::questions;
use chrono::{Duration, NaiveDateTime};

/// Length of the "published recently" window.
pub fn recent_window() -> Duration {
    Duration::days(1)
}

/// True once `now` has reached the publication date.
pub fn is_published(question: &questions::Model, now: NaiveDateTime) -> bool {
    now >= question.pub_date
}

/// True when the question went live within the last day. Future questions are never recent.
pub fn was_published_recently(question: &questions::Model, now: NaiveDateTime) -> bool {
    now - recent_window() <= question.pub_date && question.pub_date <= now
}

/// True while the deadline has not passed and the deadline is not before publication.
///
/// This does not look at `now >= pub_date`; callers that need the publication
/// gate go through `listing::find_published` first.
pub fn can_vote(question: &questions::Model, now: NaiveDateTime) -> bool {
    question.end_date >= now && question.end_date >= question.pub_date
}
