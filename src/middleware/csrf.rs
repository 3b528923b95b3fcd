//! Per-session CSRF token.
//!
//! The token is created the first time a session is seen and rendered into
//! every form as a hidden `csrf_token` field. Every POST handler calls
//! [`validate_csrf_token`] before touching anything else.

use actix_session::Session;
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Returns the session's token, storing a new one if there is none yet.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    if let Ok(Some(token)) = session.get::<String>(CSRF_SESSION_KEY) {
        return Ok(token);
    }

    let token = generate_csrf_token();
    session
        .insert(CSRF_SESSION_KEY, token.clone())
        .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
    Ok(token)
}

/// Rejects the request with 403 unless `provided` matches the session token.
pub fn validate_csrf_token(session: &Session, provided: &str) -> Result<(), Error> {
    let expected = session
        .get::<String>(CSRF_SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Failed to get CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("CSRF token not found in session"))?;

    if !tokens_match(&expected, provided) {
        log::warn!("CSRF token validation failed");
        return Err(error::ErrorForbidden("Invalid CSRF token"));
    }

    Ok(())
}

/// Comparison whose running time does not depend on where the inputs differ.
fn tokens_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
