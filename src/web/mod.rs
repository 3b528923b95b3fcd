pub mod admin;
pub mod error;
pub mod index;
pub mod login;
pub mod logout;
pub mod polls;

use actix_web::http::header;
use actix_web::HttpResponse;

pub const LOGIN_URL: &str = "/accounts/login/";

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    index::configure(conf);
    polls::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    admin::configure(conf);
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// 302 to the login page, coming back to `next` afterwards.
pub fn login_redirect(next: &str) -> HttpResponse {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    redirect(&format!("{}?next={}", LOGIN_URL, next))
}

/// Only local absolute paths are followed after login; anything else goes home.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}
