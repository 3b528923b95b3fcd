//! Published-question queries used by the public pages.

use crate::orm::{choices, questions};
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// Questions whose publication date has been reached, newest first.
/// Equal publication dates fall back to the newer id first.
pub async fn published_questions<C: ConnectionTrait>(
    db: &C,
    now: NaiveDateTime,
) -> Result<Vec<questions::Model>, DbErr> {
    questions::Entity::find()
        .filter(questions::Column::PubDate.lte(now))
        .order_by_desc(questions::Column::PubDate)
        .order_by_desc(questions::Column::Id)
        .all(db)
        .await
}

/// A single question, but only once it is published.
pub async fn find_published<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
    now: NaiveDateTime,
) -> Result<Option<questions::Model>, DbErr> {
    questions::Entity::find_by_id(question_id)
        .filter(questions::Column::PubDate.lte(now))
        .one(db)
        .await
}

/// Choices for a question in display order.
pub async fn choices_for<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
) -> Result<Vec<choices::Model>, DbErr> {
    choices::Entity::find()
        .filter(choices::Column::QuestionId.eq(question_id))
        .order_by_asc(choices::Column::Id)
        .all(db)
        .await
}
