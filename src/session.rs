//! Password hashing and the login state kept in the cookie session.
//!
//! The session cookie is signed by `actix-session`; it only ever carries the
//! user id, the CSRF token and pending flash messages.

use crate::user::Profile;
use actix_session::Session;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use sea_orm::ConnectionTrait;

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

const USER_ID_KEY: &str = "user_id";

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is not a PHC string: {}", e);
            false
        }
    }
}

/// Marks the session as belonging to `user_id`. The session key is renewed.
pub fn login_user(session: &Session, user_id: i32) -> Result<(), actix_web::Error> {
    session.renew();
    session
        .insert(USER_ID_KEY, user_id)
        .map_err(|_| actix_web::error::ErrorInternalServerError("middleware error"))
}

/// Drops everything stored in the session and issues a fresh one.
pub fn logout_user(session: &Session) {
    session.clear();
    session.renew();
}

pub fn session_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(USER_ID_KEY) {
        Ok(id) => id,
        Err(e) => {
            log::warn!("session_user_id: unreadable user id in session: {}", e);
            None
        }
    }
}

/// Resolves the logged-in user, if the session names one that still exists.
pub async fn authenticate_client_by_session<C: ConnectionTrait>(
    db: &C,
    session: &Session,
) -> Option<Profile> {
    let user_id = session_user_id(session)?;

    match Profile::get_by_id(db, user_id).await {
        Ok(Some(profile)) => Some(profile),
        Ok(None) => {
            log::debug!("authenticate_client_by_session: user {} no longer exists", user_id);
            session.remove(USER_ID_KEY);
            None
        }
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}
