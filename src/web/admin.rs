/// Staff-only question administration.
///
/// Anonymous visitors are sent to the login page, logged-in users without
/// the staff flag get a 403.
use crate::flash;
use crate::middleware::ClientCtx;
use crate::orm::questions;
use crate::poll::listing::choices_for;
use crate::poll::manage::{
    create_question, delete_question, format_datetime, list_questions, update_question,
    QuestionDraft, EXTRA_CHOICE_ROWS,
};
use crate::poll::was_published_recently;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::{entity::*, DatabaseConnection, DbErr};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_admin_root)
        .service(view_questions)
        .service(view_new_question)
        .service(create_question_post)
        .service(view_edit_question)
        .service(update_question_post)
        .service(delete_question_post);
}

const QUESTIONS_URL: &str = "/admin/questions/";

pub struct QuestionRow {
    pub question: questions::Model,
    pub published_recently: bool,
}

#[derive(Template)]
#[template(path = "admin/questions.html")]
pub struct QuestionListTemplate {
    pub client: ClientCtx,
    pub rows: Vec<QuestionRow>,
}

/// One inline choice row as it appears in the form.
pub struct ChoiceRow {
    pub index: usize,
    /// Empty for rows that are not saved yet.
    pub id: String,
    pub text: String,
    pub delete: bool,
}

impl ChoiceRow {
    fn blank(index: usize) -> Self {
        Self {
            index,
            id: String::new(),
            text: String::new(),
            delete: false,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/question_form.html")]
pub struct QuestionFormTemplate {
    pub client: ClientCtx,
    pub title: &'static str,
    pub action: String,
    pub question_text: String,
    pub pub_date: String,
    pub end_date: String,
    pub choices: Vec<ChoiceRow>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct CsrfForm {
    pub csrf_token: String,
}

/// `Some(response)` when the request must not go further.
fn check_staff(client: &ClientCtx, here: &str) -> Result<Option<HttpResponse>, Error> {
    if !client.is_user() {
        return Ok(Some(super::login_redirect(here)));
    }
    client.require_staff()?;
    Ok(None)
}

fn db_error(context: &str, e: DbErr) -> Error {
    log::error!("{}: {}", context, e);
    error::ErrorInternalServerError("Database error.")
}

fn form_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn check_form_csrf(cookies: &Session, pairs: &[(String, String)]) -> Result<(), Error> {
    crate::middleware::csrf::validate_csrf_token(cookies, form_value(pairs, "csrf_token").unwrap_or(""))
}

/// Rebuilds the submitted choice rows so a rejected form keeps its input.
fn echo_choice_rows(pairs: &[(String, String)]) -> Vec<ChoiceRow> {
    let mut rows = Vec::new();
    for index in 0.. {
        let id = form_value(pairs, &format!("choice-{}-id", index));
        let text = form_value(pairs, &format!("choice-{}-text", index));
        if id.is_none() && text.is_none() {
            break;
        }
        rows.push(ChoiceRow {
            index,
            id: id.unwrap_or_default().to_owned(),
            text: text.unwrap_or_default().to_owned(),
            delete: form_value(pairs, &format!("choice-{}-delete", index)).is_some(),
        });
    }
    rows
}

fn rejected_form(
    client: ClientCtx,
    title: &'static str,
    action: String,
    pairs: &[(String, String)],
    error: String,
) -> HttpResponse {
    QuestionFormTemplate {
        client,
        title,
        action,
        question_text: form_value(pairs, "question_text").unwrap_or_default().to_owned(),
        pub_date: form_value(pairs, "pub_date").unwrap_or_default().to_owned(),
        end_date: form_value(pairs, "end_date").unwrap_or_default().to_owned(),
        choices: echo_choice_rows(pairs),
        error: Some(error),
    }
    .to_response()
}

#[get("/admin/")]
pub async fn view_admin_root() -> HttpResponse {
    super::redirect(QUESTIONS_URL)
}

#[get("/admin/questions/")]
pub async fn view_questions(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    if let Some(res) = check_staff(&client, QUESTIONS_URL)? {
        return Ok(res);
    }

    let now = Utc::now().naive_utc();
    let rows = list_questions(db.get_ref())
        .await
        .map_err(|e| db_error("view_questions", e))?
        .into_iter()
        .map(|question| QuestionRow {
            published_recently: was_published_recently(&question, now),
            question,
        })
        .collect();

    Ok(QuestionListTemplate { client, rows }.to_response())
}

#[get("/admin/questions/new")]
pub async fn view_new_question(client: ClientCtx) -> Result<HttpResponse, Error> {
    if let Some(res) = check_staff(&client, "/admin/questions/new")? {
        return Ok(res);
    }

    Ok(QuestionFormTemplate {
        client,
        title: "Add question",
        action: QUESTIONS_URL.to_owned(),
        question_text: String::new(),
        pub_date: format_datetime(&Utc::now().naive_utc()),
        end_date: String::new(),
        choices: (0..EXTRA_CHOICE_ROWS).map(ChoiceRow::blank).collect(),
        error: None,
    }
    .to_response())
}

#[post("/admin/questions/")]
pub async fn create_question_post(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, Error> {
    check_form_csrf(&cookies, &form)?;
    if let Some(res) = check_staff(&client, "/admin/questions/new")? {
        return Ok(res);
    }

    let draft = match QuestionDraft::from_form(&form) {
        Ok(draft) => draft,
        Err(e) => {
            return Ok(rejected_form(
                client,
                "Add question",
                QUESTIONS_URL.to_owned(),
                &form,
                e.to_string(),
            ))
        }
    };

    let question = create_question(&db, &draft)
        .await
        .map_err(|e| db_error("create_question_post", e))?;

    log::info!(
        "Question {} created by {}",
        question.id,
        client.get_name()
    );
    flash::success(
        &cookies,
        format!("The question \"{}\" was added successfully.", question.question_text),
    );
    Ok(super::redirect(QUESTIONS_URL))
}

#[get("/admin/questions/{question_id}/edit")]
pub async fn view_edit_question(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let question_id = path.into_inner();
    if let Some(res) = check_staff(&client, &format!("/admin/questions/{}/edit", question_id))? {
        return Ok(res);
    }

    let question = questions::Entity::find_by_id(question_id)
        .one(db.get_ref())
        .await
        .map_err(|e| db_error("view_edit_question", e))?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;
    let existing = choices_for(db.get_ref(), question.id)
        .await
        .map_err(|e| db_error("view_edit_question", e))?;

    let saved = existing.len();
    let mut choices: Vec<ChoiceRow> = existing
        .into_iter()
        .enumerate()
        .map(|(index, choice)| ChoiceRow {
            index,
            id: choice.id.to_string(),
            text: choice.choice_text,
            delete: false,
        })
        .collect();
    choices.extend((saved..saved + EXTRA_CHOICE_ROWS).map(ChoiceRow::blank));

    Ok(QuestionFormTemplate {
        client,
        title: "Change question",
        action: format!("/admin/questions/{}", question.id),
        question_text: question.question_text,
        pub_date: format_datetime(&question.pub_date),
        end_date: format_datetime(&question.end_date),
        choices,
        error: None,
    }
    .to_response())
}

#[post("/admin/questions/{question_id}")]
pub async fn update_question_post(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, Error> {
    check_form_csrf(&cookies, &form)?;
    let question_id = path.into_inner();
    if let Some(res) = check_staff(&client, &format!("/admin/questions/{}/edit", question_id))? {
        return Ok(res);
    }

    let action = format!("/admin/questions/{}", question_id);
    let draft = match QuestionDraft::from_form(&form) {
        Ok(draft) => draft,
        Err(e) => {
            return Ok(rejected_form(
                client,
                "Change question",
                action,
                &form,
                e.to_string(),
            ))
        }
    };

    let question = update_question(&db, question_id, &draft)
        .await
        .map_err(|e| db_error("update_question_post", e))?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    log::info!(
        "Question {} changed by {}",
        question.id,
        client.get_name()
    );
    flash::success(
        &cookies,
        format!("The question \"{}\" was changed successfully.", question.question_text),
    );
    Ok(super::redirect(QUESTIONS_URL))
}

#[post("/admin/questions/{question_id}/delete")]
pub async fn delete_question_post(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;
    if let Some(res) = check_staff(&client, QUESTIONS_URL)? {
        return Ok(res);
    }

    let question_id = path.into_inner();
    let deleted = delete_question(&db, question_id)
        .await
        .map_err(|e| db_error("delete_question_post", e))?;
    if !deleted {
        return Err(error::ErrorNotFound("Question not found."));
    }

    log::info!("Question {} deleted by {}", question_id, client.get_name());
    flash::success(&cookies, "The question was deleted successfully.");
    Ok(super::redirect(QUESTIONS_URL))
}
