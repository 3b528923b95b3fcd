//! Vote recording.
//!
//! A user holds at most one vote per question. Voting again replaces the
//! previous choice instead of adding a second row. The write is a single
//! `INSERT .. ON CONFLICT (user_id, question_id) DO UPDATE`, so duplicate
//! submissions racing each other still end with one row.

use super::{listing, window};
use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::orm::{choices, votes};
use chrono::NaiveDateTime;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use std::fmt;

/// The authenticated user casting a vote.
#[derive(Clone, Copy, Debug)]
pub struct Voter<'a> {
    pub user_id: i32,
    pub username: &'a str,
    pub ip: Option<&'a str>,
}

/// A vote that was stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voted {
    pub question_id: i32,
    pub choice_id: i32,
}

#[derive(Debug)]
pub enum VoteError {
    /// Question does not exist or is not published yet.
    NotFound,
    /// No choice submitted, or the choice belongs to another question.
    NoChoiceSelected,
    /// The voting window is over.
    VotingClosed,
    Database(DbErr),
}

impl VoteError {
    /// Short machine-readable label used in audit records.
    pub fn outcome(&self) -> &'static str {
        match self {
            VoteError::NotFound => "not_found",
            VoteError::NoChoiceSelected => "no_choice",
            VoteError::VotingClosed => "closed",
            VoteError::Database(_) => "error",
        }
    }
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteError::NotFound => write!(f, "Question not found."),
            VoteError::NoChoiceSelected => write!(f, "You didn't select a choice."),
            VoteError::VotingClosed => write!(f, "The poll that you selected is not allowed."),
            VoteError::Database(e) => write!(f, "Database error while voting: {}", e),
        }
    }
}

impl std::error::Error for VoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VoteError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbErr> for VoteError {
    fn from(e: DbErr) -> Self {
        VoteError::Database(e)
    }
}

/// Validates and stores `voter`'s choice for a question.
///
/// Checks run in order: question published, choice belongs to it, window open.
/// Rejections write nothing. Every attempt produces exactly one audit event.
pub async fn record_vote(
    db: &DatabaseConnection,
    audit: &dyn AuditSink,
    voter: &Voter<'_>,
    question_id: i32,
    choice_id: Option<i32>,
    now: NaiveDateTime,
) -> Result<Voted, VoteError> {
    let result = cast_vote(db, voter.user_id, question_id, choice_id, now).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    audit.record(
        AuditEvent::new(AuditAction::Vote, voter.username)
            .ip(voter.ip)
            .question(question_id)
            .outcome(outcome),
    );

    result
}

async fn cast_vote(
    db: &DatabaseConnection,
    user_id: i32,
    question_id: i32,
    choice_id: Option<i32>,
    now: NaiveDateTime,
) -> Result<Voted, VoteError> {
    let txn = db.begin().await?;

    let question = listing::find_published(&txn, question_id, now)
        .await?
        .ok_or(VoteError::NotFound)?;

    let choice_id = choice_id.ok_or(VoteError::NoChoiceSelected)?;
    let choice = choices::Entity::find_by_id(choice_id)
        .filter(choices::Column::QuestionId.eq(question.id))
        .one(&txn)
        .await?
        .ok_or(VoteError::NoChoiceSelected)?;

    if !window::can_vote(&question, now) {
        return Err(VoteError::VotingClosed);
    }

    let vote = votes::ActiveModel {
        user_id: Set(user_id),
        question_id: Set(question.id),
        choice_id: Set(choice.id),
        voted_at: Set(now),
        ..Default::default()
    };
    votes::Entity::insert(vote)
        .on_conflict(
            OnConflict::columns([votes::Column::UserId, votes::Column::QuestionId])
                .update_columns([votes::Column::ChoiceId, votes::Column::VotedAt])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;

    Ok(Voted {
        question_id: question.id,
        choice_id: choice.id,
    })
}

/// The user's current vote on a question, if any.
pub async fn current_vote<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    question_id: i32,
) -> Result<Option<votes::Model>, DbErr> {
    votes::Entity::find()
        .filter(votes::Column::UserId.eq(user_id))
        .filter(votes::Column::QuestionId.eq(question_id))
        .one(db)
        .await
}
