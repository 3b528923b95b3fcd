//! Audit sink that keeps events in memory
#![allow(dead_code)]

use polls::audit::{AuditEvent, AuditSink, SharedAuditSink};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Same sink as the handlers see it in app data.
pub fn shared(sink: &Arc<RecordingSink>) -> SharedAuditSink {
    sink.clone()
}
