use crate::audit::{AuditAction, AuditEvent, SharedAuditSink};
use crate::flash;
use crate::ip::extract_client_ip;
use crate::middleware::ClientCtx;
use crate::session::{login_user, verify_password};
use crate::user::{find_by_username, touch_last_login};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login).service(post_login);
}

const LOGIN_FAILED: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub next: &'a str,
    pub error: Option<&'a str>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct FormData {
    csrf_token: String,
    #[validate(length(min = 1, max = 150))]
    username: String,
    #[validate(length(min = 1, max = 1000))]
    password: String,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginResultStatus {
    Success,
    BadName,
    BadPassword,
}

pub struct LoginResult {
    pub result: LoginResultStatus,
    pub user_id: Option<i32>,
}

impl LoginResult {
    fn success(user_id: i32) -> Self {
        Self {
            result: LoginResultStatus::Success,
            user_id: Some(user_id),
        }
    }
    fn fail(result: LoginResultStatus) -> Self {
        Self {
            result,
            user_id: None,
        }
    }
}

/// Checks credentials. A successful check also stamps `last_login`.
pub async fn login(db: &DatabaseConnection, name: &str, pass: &str) -> Result<LoginResult, DbErr> {
    let user = match find_by_username(db, name.trim()).await? {
        Some(user) => user,
        None => return Ok(LoginResult::fail(LoginResultStatus::BadName)),
    };

    if !verify_password(pass, &user.password) {
        return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
    }

    let user_id = user.id;
    touch_last_login(db, user).await?;

    Ok(LoginResult::success(user_id))
}

#[get("/accounts/login/")]
pub async fn view_login(client: ClientCtx, query: web::Query<NextQuery>) -> impl Responder {
    LoginTemplate {
        client,
        username: "",
        next: super::safe_next(query.next.as_deref()),
        error: None,
    }
    .to_response()
}

#[post("/accounts/login/")]
pub async fn post_login(
    req: HttpRequest,
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    audit: web::Data<SharedAuditSink>,
    form: web::Form<FormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let next = super::safe_next(form.next.as_deref());
    let username = form.username.trim();
    let ip = extract_client_ip(&req);

    let status = match form.validate() {
        Ok(()) => login(&db, username, &form.password).await.map_err(|e| {
            log::error!("post_login: {}", e);
            error::ErrorInternalServerError("DB error")
        })?,
        Err(e) => {
            log::debug!("post_login: form validation failed: {}", e);
            LoginResult::fail(LoginResultStatus::BadName)
        }
    };

    let user_id = match (status.result, status.user_id) {
        (LoginResultStatus::Success, Some(user_id)) => user_id,
        (result, _) => {
            log::debug!("login failure: {:?} for {}", result, username);
            audit.record(
                AuditEvent::new(AuditAction::LoginFailed, username)
                    .ip(ip.as_deref())
                    .outcome(match result {
                        LoginResultStatus::BadPassword => "bad_password",
                        _ => "bad_name",
                    }),
            );

            // Same message either way to avoid username enumeration.
            return Ok(LoginTemplate {
                client,
                username,
                next,
                error: Some(LOGIN_FAILED),
            }
            .to_response());
        }
    };

    login_user(&cookies, user_id)?;
    audit.record(
        AuditEvent::new(AuditAction::Login, username)
            .ip(ip.as_deref())
            .outcome("ok"),
    );
    flash::info(&cookies, format!("Welcome, {}.", username));

    Ok(super::redirect(next))
}
