use crate::middleware::ClientCtx;
use crate::orm::questions;
use crate::poll::published_questions;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index).service(view_polls_index);
}

#[derive(Template)]
#[template(path = "polls/index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub questions: Vec<questions::Model>,
}

#[get("/")]
pub async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    render_index(client, &db).await
}

#[get("/polls/")]
pub async fn view_polls_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    render_index(client, &db).await
}

async fn render_index(client: ClientCtx, db: &DatabaseConnection) -> Result<impl Responder, Error> {
    let questions = published_questions(db, Utc::now().naive_utc())
        .await
        .map_err(|e| {
            log::error!("render_index: {}", e);
            error::ErrorInternalServerError("Could not load polls.")
        })?;

    Ok(IndexTemplate { client, questions }.to_response())
}
