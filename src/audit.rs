//! Audit trail for authentication and voting.
//!
//! Handlers call into an [`AuditSink`] explicitly at the point where the event
//! happens. The default sink writes one `log` record per event under the
//! `audit` target, so it can be routed with `RUST_LOG=audit=info`.

use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    LoginFailed,
    Logout,
    Vote,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Logout => "logout",
            AuditAction::Vote => "vote",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub username: String,
    pub ip: Option<String>,
    pub question_id: Option<i32>,
    pub outcome: String,
}

impl AuditEvent {
    pub fn new(action: AuditAction, username: impl Into<String>) -> Self {
        Self {
            action,
            username: username.into(),
            ip: None,
            question_id: None,
            outcome: "ok".to_owned(),
        }
    }

    pub fn ip(mut self, ip: Option<&str>) -> Self {
        self.ip = ip.map(str::to_owned);
        self
    }

    pub fn question(mut self, question_id: i32) -> Self {
        self.question_id = Some(question_id);
        self
    }

    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = outcome.into();
        self
    }

    pub fn is_failure(&self) -> bool {
        self.action == AuditAction::LoginFailed || self.outcome != "ok"
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action={} user={} ip={} question={} outcome={}",
            self.action,
            self.username,
            self.ip.as_deref().unwrap_or("-"),
            self.question_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_owned()),
            self.outcome
        )
    }
}

/// Receives audit events. Implementations must be cheap; they run inline in request handlers.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        if event.is_failure() {
            log::warn!(target: "audit", "{}", event);
        } else {
            log::info!(target: "audit", "{}", event);
        }
    }
}

/// Shared handle stored in app data.
pub type SharedAuditSink = Arc<dyn AuditSink>;

/// The sink used when nothing else is configured.
pub fn default_sink() -> SharedAuditSink {
    Arc::new(LogAuditSink)
}
