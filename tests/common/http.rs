//! HTTP helpers: session middleware, cookies and CSRF tokens
#![allow(dead_code)]

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::header;

pub const SESSION_COOKIE: &str = "id";

pub fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[7u8; 64]))
        .cookie_secure(false)
        .build()
}

/// The session cookie set by a response, if it set one.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

/// Keeps `jar` in step with whatever the response set.
pub fn update_cookie<B>(jar: &mut Option<Cookie<'static>>, resp: &ServiceResponse<B>) {
    if let Some(cookie) = session_cookie(resp) {
        *jar = Some(cookie);
    }
}

/// Pulls the hidden csrf_token value out of a rendered form.
pub fn extract_csrf_token(body: &str) -> Option<String> {
    let marker = "name=\"csrf_token\" value=\"";
    let start = body.find(marker)? + marker.len();
    let end = body[start..].find('"')? + start;
    Some(body[start..end].to_string())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Builds the app the way the binary does, minus static files and error pages.
/// Expands to the initialised test service.
macro_rules! init_app {
    ($db:expr, $sink:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new(common::audit::shared(&$sink)))
                .wrap(polls::middleware::ClientCtx::default())
                .wrap(common::http::session_middleware())
                .configure(polls::web::configure),
        )
        .await
    };
}

/// Fetches a fresh session with its CSRF token. Expands to `(cookie, token)`.
macro_rules! new_session {
    ($app:expr) => {{
        let req = actix_web::test::TestRequest::get()
            .uri("/accounts/login/")
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        let cookie = common::http::session_cookie(&resp).expect("session cookie");
        let body = actix_web::test::read_body(resp).await;
        let token = common::http::extract_csrf_token(std::str::from_utf8(&body).unwrap())
            .expect("csrf token in login form");
        (cookie, token)
    }};
}

/// Logs `$username` in with the fixture password. Expands to `(cookie, token)`.
macro_rules! log_in {
    ($app:expr, $username:expr) => {{
        let (cookie, token) = new_session!($app);
        let req = actix_web::test::TestRequest::post()
            .uri("/accounts/login/")
            .cookie(cookie.clone())
            .set_form(&[
                ("csrf_token", token.as_str()),
                ("username", $username),
                ("password", common::fixtures::TEST_PASSWORD),
                ("next", "/"),
            ])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::FOUND,
            "login should redirect"
        );
        let mut jar = Some(cookie);
        common::http::update_cookie(&mut jar, &resp);
        (jar.unwrap(), token)
    }};
}
