//! Poll pages: detail with the vote form, results, and vote submission.

use crate::audit::SharedAuditSink;
use crate::flash;
use crate::ip::extract_client_ip;
use crate::middleware::ClientCtx;
use crate::orm::questions;
use crate::poll::listing::choices_for;
use crate::poll::vote::current_vote;
use crate::poll::{can_vote, find_published, is_published, record_vote, tally, QuestionResults};
use crate::poll::{VoteError, Voter};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_detail)
        .service(view_results)
        .service(view_vote)
        .service(post_vote);
}

#[derive(Template)]
#[template(path = "polls/detail.html")]
pub struct DetailTemplate {
    pub client: ClientCtx,
    pub question: questions::Model,
    pub choices: Vec<ChoiceOption>,
    pub voting_open: bool,
    pub error_message: Option<String>,
}

pub struct ChoiceOption {
    pub id: i32,
    pub text: String,
    /// The current user's standing vote.
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "polls/results.html")]
pub struct ResultsTemplate {
    pub client: ClientCtx,
    pub question: questions::Model,
    pub rows: Vec<ResultRow>,
    pub total_votes: i64,
}

pub struct ResultRow {
    pub text: String,
    pub votes: i64,
    pub percent: i64,
}

impl ResultsTemplate {
    fn new(client: ClientCtx, results: QuestionResults) -> Self {
        let rows = results
            .choices
            .iter()
            .map(|tally| ResultRow {
                text: tally.choice_text.clone(),
                votes: tally.votes,
                percent: results.percent(tally),
            })
            .collect();

        Self {
            client,
            total_votes: results.total_votes(),
            question: results.question,
            rows,
        }
    }
}

#[derive(Deserialize)]
pub struct VoteFormData {
    pub csrf_token: String,
    #[serde(default)]
    pub choice: Option<String>,
}

fn db_error(context: &str, e: DbErr) -> Error {
    log::error!("{}: {}", context, e);
    error::ErrorInternalServerError("Database error.")
}

/// Loads everything the detail page needs. `None` when the question is not published.
async fn build_detail(
    client: ClientCtx,
    db: &DatabaseConnection,
    question_id: i32,
    now: NaiveDateTime,
    error_message: Option<String>,
) -> Result<Option<DetailTemplate>, DbErr> {
    let question = match find_published(db, question_id, now).await? {
        Some(question) => question,
        None => return Ok(None),
    };

    let selected = match client.get_id() {
        Some(user_id) => current_vote(db, user_id, question.id)
            .await?
            .map(|vote| vote.choice_id),
        None => None,
    };
    let choices = choices_for(db, question.id)
        .await?
        .into_iter()
        .map(|choice| ChoiceOption {
            checked: selected == Some(choice.id),
            id: choice.id,
            text: choice.choice_text,
        })
        .collect();

    Ok(Some(DetailTemplate {
        voting_open: can_vote(&question, now),
        client,
        question,
        choices,
        error_message,
    }))
}

async fn render_detail(
    client: ClientCtx,
    db: &DatabaseConnection,
    question_id: i32,
    error_message: Option<String>,
) -> Result<HttpResponse, Error> {
    build_detail(client, db, question_id, Utc::now().naive_utc(), error_message)
        .await
        .map_err(|e| db_error("render_detail", e))?
        .map(|tmpl| tmpl.to_response())
        .ok_or_else(|| error::ErrorNotFound("Question not found."))
}

#[get("/polls/{question_id}/")]
pub async fn view_detail(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    render_detail(client, &db, path.into_inner(), None).await
}

#[get("/polls/{question_id}/results/")]
pub async fn view_results(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let results = tally(db.get_ref(), path.into_inner())
        .await
        .map_err(|e| db_error("view_results", e))?
        .filter(|results| is_published(&results.question, Utc::now().naive_utc()))
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    Ok(ResultsTemplate::new(client, results).to_response())
}

#[get("/polls/{question_id}/vote/")]
pub async fn view_vote(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let question_id = path.into_inner();
    if !client.is_user() {
        return Ok(super::login_redirect(&format!("/polls/{}/vote/", question_id)));
    }

    render_detail(client, &db, question_id, None).await
}

#[post("/polls/{question_id}/vote/")]
pub async fn post_vote(
    req: HttpRequest,
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    audit: web::Data<SharedAuditSink>,
    path: web::Path<i32>,
    form: web::Form<VoteFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let question_id = path.into_inner();
    let user = match client.get_user() {
        Some(user) => user.clone(),
        None => return Ok(super::login_redirect(&format!("/polls/{}/", question_id))),
    };

    // Anything that isn't a number is treated like no selection.
    let choice_id = form
        .choice
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i32>().ok());

    let ip = extract_client_ip(&req);
    let voter = Voter {
        user_id: user.id,
        username: &user.name,
        ip: ip.as_deref(),
    };

    match record_vote(
        &db,
        audit.get_ref().as_ref(),
        &voter,
        question_id,
        choice_id,
        Utc::now().naive_utc(),
    )
    .await
    {
        Ok(voted) => {
            flash::success(&cookies, "Already complete your polls.");
            Ok(super::redirect(&format!(
                "/polls/{}/results/",
                voted.question_id
            )))
        }
        Err(VoteError::NoChoiceSelected) => {
            render_detail(
                client,
                &db,
                question_id,
                Some(VoteError::NoChoiceSelected.to_string()),
            )
            .await
        }
        Err(VoteError::VotingClosed) => {
            flash::warning(&cookies, VoteError::VotingClosed.to_string());
            Ok(super::redirect("/"))
        }
        Err(VoteError::NotFound) => Err(error::ErrorNotFound("Question not found.")),
        Err(VoteError::Database(e)) => Err(db_error("post_vote", e)),
    }
}
