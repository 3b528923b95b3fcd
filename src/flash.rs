//! One-shot messages carried across a redirect in the session.
//!
//! Handlers push a message before redirecting; the request context takes all
//! pending messages when the next page is built, so each is shown once.

use actix_session::Session;
use serde::{Deserialize, Serialize};

const FLASH_KEY: &str = "_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn css_class(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

pub fn push(session: &Session, level: Level, text: impl Into<String>) {
    let mut pending = peek(session);
    pending.push(FlashMessage {
        level,
        text: text.into(),
    });

    if let Err(e) = session.insert(FLASH_KEY, pending) {
        log::error!("flash::push: unable to store message: {}", e);
    }
}

pub fn success(session: &Session, text: impl Into<String>) {
    push(session, Level::Success, text)
}

pub fn warning(session: &Session, text: impl Into<String>) {
    push(session, Level::Warning, text)
}

pub fn info(session: &Session, text: impl Into<String>) {
    push(session, Level::Info, text)
}

/// Removes and returns all pending messages.
pub fn take(session: &Session) -> Vec<FlashMessage> {
    match session.remove_as::<Vec<FlashMessage>>(FLASH_KEY) {
        Some(Ok(messages)) => messages,
        Some(Err(raw)) => {
            log::warn!("flash::take: discarding unreadable messages: {}", raw);
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn peek(session: &Session) -> Vec<FlashMessage> {
    session
        .get::<Vec<FlashMessage>>(FLASH_KEY)
        .ok()
        .flatten()
        .unwrap_or_default()
}
