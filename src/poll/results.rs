//! Vote counts per choice, always counted from the votes table.

use super::listing;
use crate::orm::{questions, votes};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceTally {
    pub choice_id: i32,
    pub choice_text: String,
    pub votes: i64,
}

#[derive(Clone, Debug)]
pub struct QuestionResults {
    pub question: questions::Model,
    /// In choice display order.
    pub choices: Vec<ChoiceTally>,
}

impl QuestionResults {
    pub fn total_votes(&self) -> i64 {
        self.choices.iter().map(|c| c.votes).sum()
    }

    pub fn votes_for(&self, choice_id: i32) -> Option<i64> {
        self.choices
            .iter()
            .find(|c| c.choice_id == choice_id)
            .map(|c| c.votes)
    }

    /// Share of the total for one choice, rounded to whole percent.
    pub fn percent(&self, tally: &ChoiceTally) -> i64 {
        let total = self.total_votes();
        if total == 0 {
            0
        } else {
            (tally.votes * 100 + total / 2) / total
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ChoiceCount {
    choice_id: i32,
    votes: i64,
}

/// Counts votes for every choice of a question. `None` when the question does not exist.
pub async fn tally<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
) -> Result<Option<QuestionResults>, DbErr> {
    let question = match questions::Entity::find_by_id(question_id).one(db).await? {
        Some(question) => question,
        None => return Ok(None),
    };

    let choices = listing::choices_for(db, question.id).await?;

    let counts: HashMap<i32, i64> = if choices.is_empty() {
        HashMap::new()
    } else {
        votes::Entity::find()
            .select_only()
            .column(votes::Column::ChoiceId)
            .column_as(Expr::col(votes::Column::Id).count(), "votes")
            .filter(votes::Column::ChoiceId.is_in(choices.iter().map(|c| c.id)))
            .group_by(votes::Column::ChoiceId)
            .into_model::<ChoiceCount>()
            .all(db)
            .await?
            .into_iter()
            .map(|row| (row.choice_id, row.votes))
            .collect()
    };

    let choices = choices
        .into_iter()
        .map(|choice| ChoiceTally {
            votes: counts.get(&choice.id).copied().unwrap_or(0),
            choice_id: choice.id,
            choice_text: choice.choice_text,
        })
        .collect();

    Ok(Some(QuestionResults { question, choices }))
}
