use crate::audit::{AuditAction, AuditEvent, SharedAuditSink};
use crate::flash;
use crate::ip::extract_client_ip;
use crate::middleware::ClientCtx;
use crate::session::logout_user;
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpRequest, HttpResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout).service(post_logout);
}

#[get("/accounts/logout/")]
pub async fn view_logout(
    req: HttpRequest,
    client: ClientCtx,
    cookies: Session,
    audit: web::Data<SharedAuditSink>,
) -> HttpResponse {
    logout(&req, &client, &cookies, audit.get_ref())
}

#[derive(Deserialize)]
pub struct LogoutForm {
    csrf_token: String,
}

#[post("/accounts/logout/")]
pub async fn post_logout(
    req: HttpRequest,
    client: ClientCtx,
    cookies: Session,
    audit: web::Data<SharedAuditSink>,
    form: web::Form<LogoutForm>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;
    Ok(logout(&req, &client, &cookies, audit.get_ref()))
}

fn logout(
    req: &HttpRequest,
    client: &ClientCtx,
    cookies: &Session,
    audit: &SharedAuditSink,
) -> HttpResponse {
    // Guests only get the redirect.
    if let Some(user) = client.get_user() {
        audit.record(
            AuditEvent::new(AuditAction::Logout, user.name.as_str())
                .ip(extract_client_ip(req).as_deref())
                .outcome("ok"),
        );
        logout_user(cookies);
        flash::info(cookies, "You have been logged out.");
    } else {
        log::debug!("view_logout: no user in session (already logged out?)");
    }

    super::redirect("/")
}
