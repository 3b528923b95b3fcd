//! Staff-side question management: create, edit and delete questions
//! together with their choices.

use crate::orm::{choices, questions, votes};
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum length of question and choice text, in characters.
pub const MAX_TEXT_LEN: usize = 200;

/// Blank choice rows offered on the creation form.
pub const EXTRA_CHOICE_ROWS: usize = 3;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceDraft {
    /// Set for choices that already exist.
    pub id: Option<i32>,
    pub text: String,
    pub delete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: String,
    pub pub_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub choices: Vec<ChoiceDraft>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DraftError {
    MissingText,
    TextTooLong,
    EmptyChoice(usize),
    ChoiceTooLong(usize),
    InvalidDate(&'static str),
    InvalidChoiceId(usize),
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::MissingText => write!(f, "Question text is required."),
            DraftError::TextTooLong => {
                write!(f, "Question text must be at most {} characters.", MAX_TEXT_LEN)
            }
            DraftError::EmptyChoice(row) => {
                write!(f, "Choice {} needs text, or tick delete to remove it.", row + 1)
            }
            DraftError::ChoiceTooLong(row) => write!(
                f,
                "Choice {} must be at most {} characters.",
                row + 1,
                MAX_TEXT_LEN
            ),
            DraftError::InvalidDate(field) => write!(f, "Enter a valid date and time for {}.", field),
            DraftError::InvalidChoiceId(row) => write!(f, "Choice {} is not valid.", row + 1),
        }
    }
}

impl std::error::Error for DraftError {}

/// Accepts the `datetime-local` input format, with or without seconds.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Formats a timestamp for a `datetime-local` input.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

impl QuestionDraft {
    /// Builds a draft from urlencoded form pairs.
    ///
    /// Expected fields: `question_text`, `pub_date`, `end_date` and, per choice
    /// row `n`, `choice-n-id`, `choice-n-text`, `choice-n-delete`. Blank new
    /// rows are dropped. Unknown fields are ignored.
    pub fn from_form(pairs: &[(String, String)]) -> Result<Self, DraftError> {
        let mut question_text = String::new();
        let mut pub_date = None;
        let mut end_date = None;
        let mut rows: BTreeMap<usize, (Option<String>, String, bool)> = BTreeMap::new();

        for (key, value) in pairs {
            match key.as_str() {
                "question_text" => question_text = value.trim().to_owned(),
                "pub_date" => pub_date = Some(value.as_str()),
                "end_date" => end_date = Some(value.as_str()),
                _ => {
                    let Some((row, field)) = parse_choice_key(key) else {
                        continue;
                    };
                    let entry = rows.entry(row).or_insert((None, String::new(), false));
                    match field {
                        "id" => entry.0 = Some(value.trim().to_owned()),
                        "text" => entry.1 = value.trim().to_owned(),
                        "delete" => entry.2 = true,
                        _ => {}
                    }
                }
            }
        }

        if question_text.is_empty() {
            return Err(DraftError::MissingText);
        }
        if question_text.chars().count() > MAX_TEXT_LEN {
            return Err(DraftError::TextTooLong);
        }

        let pub_date = pub_date
            .and_then(parse_datetime)
            .ok_or(DraftError::InvalidDate("date published"))?;
        let end_date = end_date
            .and_then(parse_datetime)
            .ok_or(DraftError::InvalidDate("end date"))?;

        let mut choices = Vec::new();
        for (row, (id, text, delete)) in rows {
            let id = match id.as_deref() {
                None | Some("") => None,
                Some(raw) => Some(
                    raw.parse::<i32>()
                        .map_err(|_| DraftError::InvalidChoiceId(row))?,
                ),
            };

            if id.is_none() && (text.is_empty() || delete) {
                continue;
            }
            if id.is_some() && text.is_empty() && !delete {
                return Err(DraftError::EmptyChoice(row));
            }
            if text.chars().count() > MAX_TEXT_LEN {
                return Err(DraftError::ChoiceTooLong(row));
            }

            choices.push(ChoiceDraft { id, text, delete });
        }

        Ok(Self {
            question_text,
            pub_date,
            end_date,
            choices,
        })
    }
}

/// Splits `choice-3-text` into `(3, "text")`.
fn parse_choice_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("choice-")?;
    let (row, field) = rest.split_once('-')?;
    Some((row.parse().ok()?, field))
}

/// All questions for the admin list, newest publication first.
pub async fn list_questions<C: ConnectionTrait>(db: &C) -> Result<Vec<questions::Model>, DbErr> {
    questions::Entity::find()
        .order_by_desc(questions::Column::PubDate)
        .order_by_desc(questions::Column::Id)
        .all(db)
        .await
}

/// Inserts a question with its choices.
pub async fn create_question(
    db: &DatabaseConnection,
    draft: &QuestionDraft,
) -> Result<questions::Model, DbErr> {
    let txn = db.begin().await?;

    let question = questions::ActiveModel {
        question_text: Set(draft.question_text.clone()),
        pub_date: Set(draft.pub_date),
        end_date: Set(draft.end_date),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for choice in draft.choices.iter().filter(|c| !c.delete) {
        insert_choice(&txn, question.id, &choice.text).await?;
    }

    txn.commit().await?;
    Ok(question)
}

/// Applies a draft to an existing question. `None` when the question is gone.
///
/// Choices flagged for deletion are removed along with their votes. Choice ids
/// that do not belong to this question are ignored.
pub async fn update_question(
    db: &DatabaseConnection,
    question_id: i32,
    draft: &QuestionDraft,
) -> Result<Option<questions::Model>, DbErr> {
    let txn = db.begin().await?;

    let question = match questions::Entity::find_by_id(question_id).one(&txn).await? {
        Some(question) => question,
        None => return Ok(None),
    };

    let mut active: questions::ActiveModel = question.into();
    active.question_text = Set(draft.question_text.clone());
    active.pub_date = Set(draft.pub_date);
    active.end_date = Set(draft.end_date);
    let question = active.update(&txn).await?;

    for choice in &draft.choices {
        match choice.id {
            Some(choice_id) => {
                let existing = choices::Entity::find_by_id(choice_id)
                    .filter(choices::Column::QuestionId.eq(question.id))
                    .one(&txn)
                    .await?;
                let Some(existing) = existing else {
                    log::warn!(
                        "Ignoring choice {} which does not belong to question {}",
                        choice_id,
                        question.id
                    );
                    continue;
                };

                if choice.delete {
                    votes::Entity::delete_many()
                        .filter(votes::Column::ChoiceId.eq(existing.id))
                        .exec(&txn)
                        .await?;
                    existing.delete(&txn).await?;
                } else if existing.choice_text != choice.text {
                    let mut active: choices::ActiveModel = existing.into();
                    active.choice_text = Set(choice.text.clone());
                    active.update(&txn).await?;
                }
            }
            None if !choice.delete => {
                insert_choice(&txn, question.id, &choice.text).await?;
            }
            None => {}
        }
    }

    txn.commit().await?;
    Ok(Some(question))
}

/// Deletes a question, its choices and its votes. Returns false when nothing matched.
pub async fn delete_question(db: &DatabaseConnection, question_id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    votes::Entity::delete_many()
        .filter(votes::Column::QuestionId.eq(question_id))
        .exec(&txn)
        .await?;
    choices::Entity::delete_many()
        .filter(choices::Column::QuestionId.eq(question_id))
        .exec(&txn)
        .await?;
    let res = questions::Entity::delete_by_id(question_id)
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(res.rows_affected > 0)
}

async fn insert_choice<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
    text: &str,
) -> Result<choices::Model, DbErr> {
    choices::ActiveModel {
        question_id: Set(question_id),
        choice_text: Set(text.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}
