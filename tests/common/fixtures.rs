//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime, Utc};
use polls::orm::{choices, questions, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

pub const TEST_PASSWORD: &str = "password123";

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Create a regular user with the shared test password
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> Result<users::Model, DbErr> {
    polls::user::create_user(db, username, TEST_PASSWORD, false).await
}

/// Create a staff user with the shared test password
pub async fn create_staff_user(db: &DatabaseConnection, username: &str) -> Result<users::Model, DbErr> {
    polls::user::create_user(db, username, TEST_PASSWORD, true).await
}

/// Create a question published `pub_days` from now (negative for the past),
/// closing `end_days` from now.
pub async fn create_question(
    db: &DatabaseConnection,
    text: &str,
    pub_days: i64,
    end_days: i64,
) -> Result<questions::Model, DbErr> {
    let now = now();
    create_question_at(db, text, now + Duration::days(pub_days), now + Duration::days(end_days)).await
}

pub async fn create_question_at(
    db: &DatabaseConnection,
    text: &str,
    pub_date: NaiveDateTime,
    end_date: NaiveDateTime,
) -> Result<questions::Model, DbErr> {
    questions::ActiveModel {
        question_text: Set(text.to_string()),
        pub_date: Set(pub_date),
        end_date: Set(end_date),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_choice(
    db: &DatabaseConnection,
    question_id: i32,
    text: &str,
) -> Result<choices::Model, DbErr> {
    choices::ActiveModel {
        question_id: Set(question_id),
        choice_text: Set(text.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// An open question (published 5 days ago, closing in 5 days) with two choices.
pub async fn create_open_poll(
    db: &DatabaseConnection,
    text: &str,
) -> Result<(questions::Model, choices::Model, choices::Model), DbErr> {
    let question = create_question(db, text, -5, 5).await?;
    let first = create_choice(db, question.id, "First").await?;
    let second = create_choice(db, question.id, "Second").await?;
    Ok((question, first, second))
}
