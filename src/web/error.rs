//! Error pages rendered by the `ErrorHandlers` middleware.

use crate::middleware::ClientCtx;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpMessage, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub client: ClientCtx,
    pub status: u16,
    pub title: &'a str,
    pub message: &'a str,
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, "Bad Request", "The request could not be understood.")
}

pub fn render_403<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(
        res,
        "Forbidden",
        "You do not have permission to view this page.",
    )
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, "Not Found", "The page you requested does not exist.")
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(
        res,
        "Server Error",
        "Something went wrong on our end. Please try again later.",
    )
}

fn render<B>(
    res: ServiceResponse<B>,
    title: &str,
    message: &str,
) -> Result<ErrorHandlerResponse<B>> {
    let (req, res) = res.into_parts();
    let client = ClientCtx::get_or_default_from_extensions(&mut req.extensions_mut());

    let body = ErrorTemplate {
        client,
        status: res.status().as_u16(),
        title,
        message,
    }
    .render()
    .map_err(|e| {
        log::error!("error page: template failed to render: {}", e);
        actix_web::error::ErrorInternalServerError("Template error")
    })?;

    let mut res = res.set_body(body);
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    let res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}
